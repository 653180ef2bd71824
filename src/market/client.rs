//! Gamma market listing client.

use std::future::Future;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::error::MarketError;
use crate::metrics;

use super::types::{ListingResponse, RawMarket};

/// Anything that can hand the pipeline a batch of raw markets.
pub trait MarketSource {
    /// Fetch one snapshot of active markets.
    fn fetch_markets(&self) -> impl Future<Output = Result<Vec<RawMarket>, MarketError>> + Send;
}

/// Polymarket Gamma API client.
#[derive(Debug, Clone)]
pub struct GammaClient {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// Listing endpoint.
    markets_url: String,
    /// Optional API key.
    api_key: Option<String>,
    /// Requested page size.
    limit: u32,
}

impl GammaClient {
    /// Create a new Gamma client from config.
    pub fn new(config: &Config) -> Result<Self, MarketError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.http_timeout_ms))
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("polymarket-screener/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let api_key = config
            .polymarket_api_key
            .clone()
            .filter(|key| !key.trim().is_empty());

        Ok(Self {
            http,
            markets_url: config.gamma_api_url.clone(),
            api_key,
            limit: config.fetch_limit,
        })
    }

    /// Get the listing endpoint.
    pub fn markets_url(&self) -> &str {
        &self.markets_url
    }

    /// Whether requests carry an API key.
    pub fn is_authenticated(&self) -> bool {
        self.api_key.is_some()
    }

    /// Fetch active markets from the listing endpoint.
    #[instrument(skip(self), fields(url = %self.markets_url))]
    pub async fn get_active_markets(&self) -> Result<Vec<RawMarket>, MarketError> {
        let start = Instant::now();
        let limit = self.limit.to_string();

        let mut request = self
            .http
            .get(&self.markets_url)
            .query(&[("active", "true"), ("closed", "false"), ("limit", limit.as_str())])
            .header("Accept", "application/json");

        if let Some(key) = &self.api_key {
            request = request.header("X-API-Key", key);
        } else {
            debug!("No API key configured, using public listing");
        }

        let response = request.send().await?;
        metrics::record_http_latency(start, "markets");

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(MarketError::FetchFailed {
                url: self.markets_url.clone(),
                reason: format!("HTTP {} - {}", status, snippet),
            });
        }

        let body = response.text().await?;
        let markets = parse_listing(&body)?;

        info!(count = markets.len(), "Fetched active markets");

        Ok(markets)
    }
}

impl MarketSource for GammaClient {
    async fn fetch_markets(&self) -> Result<Vec<RawMarket>, MarketError> {
        self.get_active_markets().await
    }
}

/// Parse a listing body, dropping records that are not market objects and
/// markets the listing does not flag as open.
pub fn parse_listing(body: &str) -> Result<Vec<RawMarket>, MarketError> {
    let listing: ListingResponse = serde_json::from_str(body)
        .map_err(|e| MarketError::ParseError(format!("Failed to parse listing: {}", e)))?;

    let records = listing.into_records();
    let received = records.len();

    let markets: Vec<RawMarket> = records
        .into_iter()
        .filter_map(|record| {
            if !record.is_object() {
                warn!(record = %record, "Skipping non-object market record");
                return None;
            }
            match serde_json::from_value::<RawMarket>(record) {
                Ok(market) => Some(market),
                Err(e) => {
                    warn!(error = %e, "Skipping undecodable market record");
                    None
                }
            }
        })
        .filter(RawMarket::is_open)
        .collect();

    metrics::inc_markets_fetched(received as u64);
    debug!(received, open = markets.len(), "Parsed market listing");

    Ok(markets)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config::from_pairs(vec![(
            "GAMMA_API_URL".to_string(),
            "https://gamma-api.polymarket.com/markets".to_string(),
        )])
        .unwrap()
    }

    #[test]
    fn client_creation_works() {
        let client = GammaClient::new(&test_config()).unwrap();
        assert_eq!(client.markets_url(), "https://gamma-api.polymarket.com/markets");
        assert!(!client.is_authenticated());
    }

    #[test]
    fn blank_api_key_is_treated_as_absent() {
        let mut config = test_config();
        config.polymarket_api_key = Some("   ".to_string());
        let client = GammaClient::new(&config).unwrap();
        assert!(!client.is_authenticated());
    }

    #[test]
    fn parse_listing_keeps_open_markets_only() {
        let body = r#"[
            {"id": "1", "question": "Open?", "active": true},
            {"id": "2", "question": "Closed?", "active": false, "closed": true},
            {"id": "3", "question": "Not closed?", "closed": false}
        ]"#;

        let markets = parse_listing(body).unwrap();
        let ids: Vec<String> = markets.iter().map(RawMarket::id_string).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn parse_listing_skips_non_object_records() {
        let body = r#"{"data": [42, "junk", {"id": "7", "active": true}]}"#;

        let markets = parse_listing(body).unwrap();
        assert_eq!(markets.len(), 1);
        assert_eq!(markets[0].id_string(), "7");
    }

    #[test]
    fn parse_listing_keeps_records_with_mistyped_fields() {
        let body = r#"[
            {"id": 1, "question": "Numeric timestamp", "active": true,
             "updatedAt": 1700000000, "outcomePrices": ["0.45", "0.55"], "volume": "90000"},
            {"id": 2, "question": "String flag", "active": "true", "closed": false,
             "outcomePrices": ["0.44", "0.56"], "volume": "90000"},
            {"id": 3, "question": ["odd"], "events": {"slug": "x"}, "closed": false,
             "outcomePrices": ["0.43", "0.57"], "volume": "90000"}
        ]"#;

        let markets = parse_listing(body).unwrap();
        let ids: Vec<String> = markets.iter().map(RawMarket::id_string).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);

        let result = crate::pipeline::run_default(&markets).unwrap();
        assert_eq!(result.tier, crate::analysis::FallbackTier::Filtered);
        assert_eq!(result.total_count, 3);
    }

    #[test]
    fn parse_listing_rejects_non_json() {
        let result = parse_listing("<html>rate limited</html>");
        assert!(matches!(result, Err(MarketError::ParseError(_))));
    }
}
