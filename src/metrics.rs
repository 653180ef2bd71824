//! Prometheus metrics for the screening pipeline.
//!
//! This module provides metrics for:
//! - Upstream listing fetch latency and failures
//! - Records received, rejected and published
//! - Pipeline run latency and which fallback tier produced the output

use std::time::Instant;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::debug;

use crate::analysis::FallbackTier;

// === Metric Name Constants ===

/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_ms";
/// Pipeline run latency metric name.
pub const METRIC_PIPELINE_LATENCY: &str = "pipeline_run_latency_ms";
/// Raw market records received counter metric name.
pub const METRIC_MARKETS_FETCHED: &str = "markets_fetched_total";
/// Records rejected by the normalizer counter metric name.
pub const METRIC_MARKETS_REJECTED: &str = "markets_rejected_total";
/// Upstream fetch failures counter metric name.
pub const METRIC_FETCH_FAILURES: &str = "market_fetch_failures_total";
/// Result sets produced, labelled by fallback tier.
pub const METRIC_RESULT_SETS: &str = "result_sets_total";
/// Opportunities in the latest result set.
pub const METRIC_OPPORTUNITIES_PUBLISHED: &str = "opportunities_published";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "HTTP request latency in milliseconds"
    );
    describe_histogram!(
        METRIC_PIPELINE_LATENCY,
        "Normalize, analyze and rank latency in milliseconds"
    );

    describe_counter!(
        METRIC_MARKETS_FETCHED,
        "Total number of raw market records received"
    );
    describe_counter!(
        METRIC_MARKETS_REJECTED,
        "Total number of records dropped during normalization"
    );
    describe_counter!(
        METRIC_FETCH_FAILURES,
        "Total number of failed market listing fetches"
    );
    describe_counter!(
        METRIC_RESULT_SETS,
        "Total number of result sets produced, by fallback tier"
    );
    describe_gauge!(
        METRIC_OPPORTUNITIES_PUBLISHED,
        "Number of opportunities in the latest result set"
    );

    debug!("Metrics initialized");
}

/// Install the global Prometheus recorder and register descriptions.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    init_metrics();
    Ok(handle)
}

/// Record HTTP request latency.
pub fn record_http_latency(start: Instant, endpoint: &str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_HTTP_REQUEST_LATENCY, "endpoint" => endpoint.to_string()).record(latency_ms);
}

/// Count raw records received from upstream.
pub fn inc_markets_fetched(count: u64) {
    counter!(METRIC_MARKETS_FETCHED).increment(count);
}

/// Count records rejected by the normalizer.
pub fn inc_markets_rejected(count: u64) {
    counter!(METRIC_MARKETS_REJECTED).increment(count);
}

/// Increment fetch failures counter.
pub fn inc_fetch_failures() {
    counter!(METRIC_FETCH_FAILURES).increment(1);
}

/// Count a result set under its fallback tier.
pub fn record_fallback_tier(tier: FallbackTier) {
    counter!(METRIC_RESULT_SETS, "tier" => tier.to_string()).increment(1);
}

/// Set the published opportunity gauge.
pub fn set_opportunities_published(count: usize) {
    gauge!(METRIC_OPPORTUNITIES_PUBLISHED).set(count as f64);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric.
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        histogram!(self.metric_name).record(self.elapsed_ms());
    }
}

/// Create a latency timer for a pipeline run.
pub fn timer_pipeline() -> LatencyTimer {
    LatencyTimer::new(METRIC_PIPELINE_LATENCY)
}
