//! Unified error types for the screener.

use rust_decimal::Decimal;
use thiserror::Error;

/// Unified error type for the screener.
#[derive(Error, Debug)]
pub enum ScreenerError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration values are present but unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Market fetch error.
    #[error("market error: {0}")]
    Market(#[from] MarketError),

    /// Analysis pipeline error.
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors fetching market listings from the upstream API.
#[derive(Error, Debug)]
pub enum MarketError {
    /// The listing request returned a non-success status.
    #[error("failed to fetch markets from {url}: {reason}")]
    FetchFailed {
        /// The endpoint that failed.
        url: String,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to parse the listing body.
    #[error("failed to parse market data: {0}")]
    ParseError(String),

    /// HTTP request failed.
    #[error("http request failed: {0}")]
    HttpError(#[from] reqwest::Error),
}

/// A raw record that cannot be turned into a normalized market.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// Both outcome prices resolved to exactly zero.
    #[error("market {id} has no usable prices")]
    ZeroPrices {
        /// Identifier of the rejected market.
        id: String,
    },

    /// An outcome price lies outside `[0, 1]`.
    #[error("market {id} has out-of-range prices (yes {yes}, no {no})")]
    PriceOutOfRange {
        /// Identifier of the rejected market.
        id: String,
        /// Resolved YES price.
        yes: Decimal,
        /// Resolved NO price.
        no: Decimal,
    },
}

/// Filter/rank pipeline errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// No upstream records and the embedded samples produced nothing either.
    #[error("no market data available: upstream batch empty and sample fallback produced no opportunities")]
    NoData,

    /// Filter thresholds are inconsistent.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),
}

impl PipelineError {
    /// Build an [`PipelineError::InvalidFilter`] for an out-of-range threshold.
    pub fn negative_threshold(name: &str, value: Decimal) -> Self {
        PipelineError::InvalidFilter(format!("{name} must be non-negative, got {value}"))
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, ScreenerError>;
