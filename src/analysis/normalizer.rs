//! Raw listing record to canonical market conversion.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::debug;

use super::classifier::{classify, Category};
use crate::error::NormalizeError;
use crate::market::RawMarket;

/// Default base URL for market deep links.
pub const DEFAULT_MARKET_BASE_URL: &str = "https://polymarket.com";

/// Canonical market record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedMarket {
    /// Market identifier.
    pub id: String,
    /// Market question text.
    pub question: String,
    /// Market slug, when the listing carries one.
    pub slug: Option<String>,
    /// Slug of the first parent event.
    pub event_slug: Option<String>,
    /// Inferred category.
    pub category: Category,
    /// YES outcome price.
    #[serde(with = "rust_decimal::serde::float")]
    pub yes_price: Decimal,
    /// NO outcome price.
    #[serde(with = "rust_decimal::serde::float")]
    pub no_price: Decimal,
    /// Traded volume.
    #[serde(with = "rust_decimal::serde::float")]
    pub volume: Decimal,
    /// Available liquidity.
    #[serde(with = "rust_decimal::serde::float")]
    pub liquidity: Decimal,
    /// Last update time.
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
    /// Time remaining in milliseconds; 0 when unknown.
    pub time_left_ms: i64,
    /// Deep link to the market page.
    pub market_url: String,
}

/// Where a record's two outcome prices come from.
#[derive(Debug, Clone, PartialEq)]
pub enum PriceSource {
    /// `outcomePrices` as an array with at least two elements.
    Pair(Value, Value),
    /// `outcomePrices` as a JSON-encoded string.
    Encoded(String),
    /// No usable `outcomePrices`, but both quotes are present.
    Quotes {
        /// Best bid, used as the YES price.
        bid: Value,
        /// Best ask, used as the NO price.
        ask: Value,
    },
    /// Nothing usable.
    Missing,
}

impl PriceSource {
    /// Pick the price shape present on a raw record.
    pub fn from_raw(raw: &RawMarket) -> Self {
        match &raw.outcome_prices {
            Some(Value::Array(items)) if items.len() >= 2 => {
                return PriceSource::Pair(items[0].clone(), items[1].clone());
            }
            Some(Value::String(encoded)) => return PriceSource::Encoded(encoded.clone()),
            _ => {}
        }

        match (&raw.best_bid, &raw.best_ask) {
            (Some(bid), Some(ask)) if !bid.is_null() && !ask.is_null() => PriceSource::Quotes {
                bid: bid.clone(),
                ask: ask.clone(),
            },
            _ => PriceSource::Missing,
        }
    }

    /// Resolve to `(yes, no)`; anything unparsable becomes zero.
    pub fn resolve(&self) -> (Decimal, Decimal) {
        match self {
            PriceSource::Pair(yes, no) => (parse_decimal(yes), parse_decimal(no)),
            PriceSource::Encoded(encoded) => match serde_json::from_str::<Vec<Value>>(encoded) {
                Ok(items) => (
                    items.first().map(parse_decimal).unwrap_or_default(),
                    items.get(1).map(parse_decimal).unwrap_or_default(),
                ),
                Err(_) => (Decimal::ZERO, Decimal::ZERO),
            },
            PriceSource::Quotes { bid, ask } => (parse_decimal(bid), parse_decimal(ask)),
            PriceSource::Missing => (Decimal::ZERO, Decimal::ZERO),
        }
    }
}

/// Best-effort numeric parse of a JSON number or numeric string; zero otherwise.
pub fn parse_decimal(value: &Value) -> Decimal {
    match value {
        Value::Number(n) => parse_decimal_str(&n.to_string()),
        Value::String(s) => parse_decimal_str(s),
        _ => Decimal::ZERO,
    }
}

/// Numbers too large for `Decimal` saturate at its bounds.
fn parse_decimal_str(s: &str) -> Decimal {
    let s = s.trim();
    if let Ok(value) = Decimal::from_str(s).or_else(|_| Decimal::from_scientific(s)) {
        return value;
    }

    match s.parse::<f64>() {
        Ok(f) if f.is_finite() && f.abs() >= 1.0 => {
            debug!(value = s, "Saturating out-of-range number");
            if f.is_sign_negative() {
                Decimal::MIN
            } else {
                Decimal::MAX
            }
        }
        _ => Decimal::ZERO,
    }
}

fn is_probability(price: Decimal) -> bool {
    (Decimal::ZERO..=Decimal::ONE).contains(&price)
}

fn parse_non_negative(primary: Option<&Value>, secondary: Option<&Value>) -> Decimal {
    primary
        .filter(|v| !v.is_null())
        .or(secondary)
        .map(parse_decimal)
        .unwrap_or_default()
        .max(Decimal::ZERO)
}

fn parse_time_left(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Some(v @ Value::String(_)) => parse_decimal(v).trunc().to_i64().unwrap_or(0),
        _ => 0,
    }
}

/// Build the deep link for a market.
pub fn market_url(base: &str, id: &str, event_slug: Option<&str>, slug: Option<&str>) -> String {
    let base = base.trim_end_matches('/');
    match (event_slug, slug.filter(|s| !s.is_empty())) {
        (Some(event), Some(market)) => format!("{}/event/{}/{}", base, event, market),
        _ => format!("{}/market/{}", base, id),
    }
}

/// Normalize a raw record using the default link base.
pub fn normalize(raw: &RawMarket) -> Result<NormalizedMarket, NormalizeError> {
    normalize_with_base(raw, DEFAULT_MARKET_BASE_URL)
}

/// Normalize a raw record, building links under `base_url`.
pub fn normalize_with_base(
    raw: &RawMarket,
    base_url: &str,
) -> Result<NormalizedMarket, NormalizeError> {
    let id = raw.id_string();
    let (yes_price, no_price) = PriceSource::from_raw(raw).resolve();

    if yes_price.is_zero() && no_price.is_zero() {
        return Err(NormalizeError::ZeroPrices { id });
    }
    if !is_probability(yes_price) || !is_probability(no_price) {
        return Err(NormalizeError::PriceOutOfRange { id, yes: yes_price, no: no_price });
    }

    let question = raw.question.clone().unwrap_or_default();
    let event_slug = raw.event_slug();
    let category = classify(&question, event_slug);
    let market_url = market_url(base_url, &id, event_slug, raw.slug.as_deref());

    Ok(NormalizedMarket {
        category,
        question,
        slug: raw.slug.clone(),
        event_slug: event_slug.map(str::to_string),
        yes_price,
        no_price,
        volume: parse_non_negative(raw.volume.as_ref(), raw.volume_num.as_ref()),
        liquidity: parse_non_negative(raw.liquidity.as_ref(), raw.liquidity_num.as_ref()),
        updated_at: raw
            .updated_at
            .as_deref()
            .and_then(|s| OffsetDateTime::parse(s, &Rfc3339).ok()),
        time_left_ms: parse_time_left(raw.time_left.as_ref()),
        market_url,
        id,
    })
}
