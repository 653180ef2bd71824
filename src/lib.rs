//! Polymarket mispricing screener.
//!
//! Pulls active market listings from the Gamma API, measures how far each
//! binary market's outcome prices sit from fair value, and publishes the
//! filtered, ranked result as a static dashboard or over HTTP.
//!
//! # Pipeline
//!
//! ```text
//! raw records → normalize → analyze → filter/rank → ResultSet
//! ```
//!
//! An empty filter result falls back to every analyzed market, and an empty
//! batch falls back to embedded sample markets, so the dashboard always has
//! something to show.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`market`]: Raw listing types, Gamma client and sample markets
//! - [`analysis`]: Classification, normalization, signals and ranking
//! - [`pipeline`]: Batch orchestration
//! - [`dashboard`]: Formatting, pagination and HTML output
//! - [`api`]: HTTP API for the dashboard, health and metrics
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod analysis;
pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod market;
pub mod metrics;
pub mod pipeline;
pub mod utils;

pub use config::Config;
pub use error::{Result, ScreenerError};
