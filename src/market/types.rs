//! Raw market records as returned by the Gamma listing API.
//!
//! The listing shape drifts between API versions: numbers arrive as JSON
//! numbers or numeric strings, outcome prices as an array or a JSON-encoded
//! string, and some fields have alternate names. Everything here is kept
//! loose (`serde_json::Value`) and resolved by the normalizer. Typed fields
//! go through [`lenient`], so a wrongly typed field reads as absent instead
//! of failing the whole record.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Deserialize `Option<T>`, mapping a value of the wrong shape to `None`.
pub fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// Deserialize a boolean flag that may arrive as `true` or `"true"`.
pub fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(flag)) => Some(flag),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

/// One market record from the listing endpoint. No field is trusted.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMarket {
    /// Market identifier (string or number upstream).
    #[serde(default)]
    pub id: Option<Value>,
    /// Market question text.
    #[serde(default, deserialize_with = "lenient")]
    pub question: Option<String>,
    /// Market slug.
    #[serde(default, deserialize_with = "lenient")]
    pub slug: Option<String>,
    /// Parent events; the first one's slug is used for links and categories.
    #[serde(default, deserialize_with = "lenient")]
    pub events: Option<Vec<RawEvent>>,
    /// Outcome prices: array, JSON-encoded string, or absent.
    #[serde(default)]
    pub outcome_prices: Option<Value>,
    /// Traded volume.
    #[serde(default)]
    pub volume: Option<Value>,
    /// Traded volume, numeric variant.
    #[serde(default)]
    pub volume_num: Option<Value>,
    /// Available liquidity.
    #[serde(default)]
    pub liquidity: Option<Value>,
    /// Available liquidity, numeric variant.
    #[serde(default)]
    pub liquidity_num: Option<Value>,
    /// Last update timestamp (ISO 8601).
    #[serde(default, deserialize_with = "lenient")]
    pub updated_at: Option<String>,
    /// Explicit time remaining in milliseconds.
    #[serde(default)]
    pub time_left: Option<Value>,
    /// Best bid quote.
    #[serde(default)]
    pub best_bid: Option<Value>,
    /// Best ask quote.
    #[serde(default)]
    pub best_ask: Option<Value>,
    /// Whether the market is active.
    #[serde(default, deserialize_with = "lenient_flag")]
    pub active: Option<bool>,
    /// Whether the market is closed.
    #[serde(default, deserialize_with = "lenient_flag")]
    pub closed: Option<bool>,
}

impl RawMarket {
    /// Identifier as a string; numeric ids are rendered verbatim.
    pub fn id_string(&self) -> String {
        match &self.id {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    }

    /// Slug of the first parent event, if any.
    pub fn event_slug(&self) -> Option<&str> {
        self.events
            .as_ref()
            .and_then(|events| events.first())
            .and_then(|event| event.slug.as_deref())
            .filter(|slug| !slug.is_empty())
    }

    /// Whether the listing flags this market as tradable.
    pub fn is_open(&self) -> bool {
        self.active == Some(true) || self.closed == Some(false)
    }
}

/// Parent event reference nested in a market record.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawEvent {
    /// Event slug.
    #[serde(default, deserialize_with = "lenient")]
    pub slug: Option<String>,
}

/// Listing body: either a bare array or an object wrapping one.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListingResponse {
    /// `[ {...}, {...} ]`
    List(Vec<Value>),
    /// `{ "markets": [...] }` or `{ "data": [...] }`
    Wrapped {
        /// Records under `markets`.
        #[serde(default)]
        markets: Option<Vec<Value>>,
        /// Records under `data`.
        #[serde(default)]
        data: Option<Vec<Value>>,
    },
}

impl ListingResponse {
    /// Unwrap into the record list, whatever the envelope.
    pub fn into_records(self) -> Vec<Value> {
        match self {
            ListingResponse::List(records) => records,
            ListingResponse::Wrapped { markets, data } => markets.or(data).unwrap_or_default(),
        }
    }
}
