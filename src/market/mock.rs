//! Embedded sample markets and an in-memory market source.
//!
//! The samples back the last fallback tier of the filter/rank engine and the
//! `sample` CLI command; the mock source stands in for the Gamma client in
//! tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::MarketError;

use super::client::MarketSource;
use super::types::{RawEvent, RawMarket};

/// Time left carried by every sample market, in milliseconds (~170 days).
const SAMPLE_TIME_LEFT_MS: i64 = 14_725_816_016;

struct Sample {
    id: &'static str,
    question: &'static str,
    slug: &'static str,
    event_slug: &'static str,
    prices: [f64; 2],
    volume: u64,
    liquidity: u64,
    minutes_ago: i64,
}

const SAMPLES: [Sample; 5] = [
    Sample {
        id: "mock-1",
        question: "Will Bitcoin hit $100K before 2026?",
        slug: "bitcoin-100k-before-2026",
        event_slug: "crypto-memes",
        prices: [0.48, 0.52],
        volume: 2_500_000,
        liquidity: 1_200_000,
        minutes_ago: 5,
    },
    Sample {
        id: "mock-2",
        question: "Will ETH ETF be approved in 2025?",
        slug: "eth-etf-approval-2025",
        event_slug: "crypto-regulation",
        prices: [0.47, 0.53],
        volume: 1_800_000,
        liquidity: 846_000,
        minutes_ago: 10,
    },
    Sample {
        id: "mock-3",
        question: "Will Trump win 2024 election?",
        slug: "trump-win-2024",
        event_slug: "us-presidential-election-2024",
        prices: [0.51, 0.49],
        volume: 5_000_000,
        liquidity: 2_550_000,
        minutes_ago: 2,
    },
    Sample {
        id: "mock-4",
        question: "Will Fed cut rates in June?",
        slug: "fed-cut-rates-june",
        event_slug: "fed-meeting",
        prices: [0.49, 0.51],
        volume: 1_200_000,
        liquidity: 588_000,
        minutes_ago: 15,
    },
    Sample {
        id: "mock-5",
        question: "Will Recession hit US in 2025?",
        slug: "recession-us-2025",
        event_slug: "economic-outlook",
        prices: [0.52, 0.48],
        volume: 800_000,
        liquidity: 416_000,
        minutes_ago: 8,
    },
];

/// Number of embedded sample markets.
pub const SAMPLE_COUNT: usize = SAMPLES.len();

/// Embedded sample markets in raw listing shape, timestamped relative to now.
pub fn sample_markets() -> Vec<RawMarket> {
    let now = OffsetDateTime::now_utc();

    SAMPLES
        .iter()
        .map(|s| {
            let updated_at = (now - time::Duration::minutes(s.minutes_ago))
                .format(&Rfc3339)
                .ok();

            RawMarket {
                id: Some(json!(s.id)),
                question: Some(s.question.to_string()),
                slug: Some(s.slug.to_string()),
                events: Some(vec![RawEvent {
                    slug: Some(s.event_slug.to_string()),
                }]),
                outcome_prices: Some(json!(s.prices)),
                volume: Some(json!(s.volume)),
                liquidity: Some(json!(s.liquidity)),
                updated_at,
                time_left: Some(json!(SAMPLE_TIME_LEFT_MS)),
                active: Some(true),
                closed: Some(false),
                ..Default::default()
            }
        })
        .collect()
}

/// Configuration for mock source behavior.
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Whether fetches fail with a transport error.
    pub fail_fetch: bool,
    /// Simulated latency in milliseconds.
    pub latency_ms: u64,
}

/// In-memory market source for testing.
#[derive(Debug, Clone, Default)]
pub struct MockMarketSource {
    /// Mock configuration.
    config: MockConfig,
    /// Markets returned by every fetch.
    markets: Arc<Mutex<Vec<RawMarket>>>,
}

impl MockMarketSource {
    /// Create a mock source returning the given markets.
    pub fn new(markets: Vec<RawMarket>) -> Self {
        Self {
            config: MockConfig::default(),
            markets: Arc::new(Mutex::new(markets)),
        }
    }

    /// Create a mock source with custom configuration and no markets.
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            config,
            markets: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Replace the markets returned by subsequent fetches.
    pub fn set_markets(&self, markets: Vec<RawMarket>) {
        if let Ok(mut guard) = self.markets.lock() {
            *guard = markets;
        }
    }
}

impl MarketSource for MockMarketSource {
    async fn fetch_markets(&self) -> Result<Vec<RawMarket>, MarketError> {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }

        if self.config.fail_fetch {
            return Err(MarketError::FetchFailed {
                url: "mock://markets".to_string(),
                reason: "Mock fetch failure".to_string(),
            });
        }

        self.markets
            .lock()
            .map(|markets| markets.clone())
            .map_err(|_| MarketError::ParseError("mock market store poisoned".to_string()))
    }
}
