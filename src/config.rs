//! Application configuration loaded from environment variables.

use rust_decimal::Decimal;
use serde::Deserialize;
use url::Url;

use crate::analysis::FilterConfig;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Polymarket API ===
    /// Optional API key, sent as `X-API-Key` when present.
    #[serde(default)]
    pub polymarket_api_key: Option<String>,

    /// Gamma market listing endpoint.
    #[serde(default = "default_gamma_url")]
    pub gamma_api_url: String,

    /// Base URL used to build market deep links.
    #[serde(default = "default_market_base_url")]
    pub market_base_url: String,

    /// Maximum number of markets requested per fetch.
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: u32,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_ms: u64,

    // === Filter Thresholds ===
    /// Minimum spread from 0.50 to keep a market.
    #[serde(default = "default_min_spread")]
    pub min_spread: Decimal,

    /// Maximum spread from 0.50 to keep a market.
    #[serde(default = "default_max_spread")]
    pub max_spread: Decimal,

    /// Minimum traded volume to keep a market.
    #[serde(default = "default_min_volume")]
    pub min_volume: Decimal,

    // === Output ===
    /// Directory receiving `data.json` and `index.html`.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Seconds between refreshes in serve mode.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    // === Server Configuration ===
    /// HTTP server port for the dashboard and API.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,
}

fn default_gamma_url() -> String {
    "https://gamma-api.polymarket.com/markets".to_string()
}

fn default_market_base_url() -> String {
    "https://polymarket.com".to_string()
}

fn default_fetch_limit() -> u32 {
    500
}

fn default_http_timeout() -> u64 {
    10_000
}

fn default_min_spread() -> Decimal {
    Decimal::new(15, 3) // 0.015
}

fn default_max_spread() -> Decimal {
    Decimal::new(50, 2) // 0.50
}

fn default_min_volume() -> Decimal {
    Decimal::new(50_000, 0)
}

fn default_output_dir() -> String {
    "dist".to_string()
}

fn default_refresh_interval() -> u64 {
    300
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Build configuration from explicit key/value pairs.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter(pairs)
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        Url::parse(&self.gamma_api_url)
            .map_err(|e| format!("GAMMA_API_URL is not a valid URL: {}", e))?;
        Url::parse(&self.market_base_url)
            .map_err(|e| format!("MARKET_BASE_URL is not a valid URL: {}", e))?;

        if self.fetch_limit == 0 {
            return Err("FETCH_LIMIT must be at least 1".to_string());
        }

        if self.refresh_interval_secs == 0 {
            return Err("REFRESH_INTERVAL_SECS must be at least 1".to_string());
        }

        self.filter_config().validate().map_err(|e| e.to_string())
    }

    /// Thresholds handed to the filter/rank engine.
    pub fn filter_config(&self) -> FilterConfig {
        FilterConfig {
            min_spread: self.min_spread,
            max_spread: self.max_spread,
            min_volume: self.min_volume,
        }
    }

    /// Whether an API credential is configured.
    pub fn has_api_key(&self) -> bool {
        self.polymarket_api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}
