//! Market module for Polymarket listing data.
//!
//! This module handles:
//! - Raw listing record types
//! - Gamma API client and the `MarketSource` seam
//! - Embedded sample markets and a mock source for testing

pub mod client;
pub mod mock;
pub mod types;

pub use client::{parse_listing, GammaClient, MarketSource};
pub use mock::{sample_markets, MockConfig, MockMarketSource, SAMPLE_COUNT};
pub use types::{RawEvent, RawMarket};
