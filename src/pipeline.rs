//! Pipeline orchestration: raw records to a ranked result set.

use tracing::{debug, info, instrument, warn};

use crate::analysis::normalizer::DEFAULT_MARKET_BASE_URL;
use crate::analysis::{analyze, filter_and_rank, normalize_with_base, FilterConfig, Opportunity, ResultSet};
use crate::error::PipelineError;
use crate::market::{MarketSource, RawMarket};
use crate::metrics;

/// Run the pipeline over a batch, linking markets under the default base URL.
pub fn run(raw_markets: &[RawMarket], cfg: &FilterConfig) -> Result<ResultSet, PipelineError> {
    run_with_base(raw_markets, cfg, DEFAULT_MARKET_BASE_URL)
}

/// Run the pipeline with the default thresholds.
pub fn run_default(raw_markets: &[RawMarket]) -> Result<ResultSet, PipelineError> {
    run(raw_markets, &FilterConfig::default())
}

/// Normalize, analyze and rank a batch of raw records.
///
/// Records that fail normalization are dropped. The result is never empty
/// unless the embedded samples are also unusable.
pub fn run_with_base(
    raw_markets: &[RawMarket],
    cfg: &FilterConfig,
    base_url: &str,
) -> Result<ResultSet, PipelineError> {
    cfg.validate()?;
    let _timer = metrics::timer_pipeline();

    let mut rejected = 0u64;
    let opportunities: Vec<Opportunity> = raw_markets
        .iter()
        .filter_map(|raw| match normalize_with_base(raw, base_url) {
            Ok(market) => Some(analyze(market)),
            Err(e) => {
                debug!(error = %e, "Dropping market");
                rejected += 1;
                None
            }
        })
        .collect();

    if rejected > 0 {
        metrics::inc_markets_rejected(rejected);
    }
    debug!(
        received = raw_markets.len(),
        analyzed = opportunities.len(),
        rejected,
        "Analyzed market batch"
    );

    let result = filter_and_rank(opportunities, cfg)?;
    metrics::set_opportunities_published(result.total_count);
    Ok(result)
}

/// Fetch from `source` and run the pipeline, using the default base URL.
pub async fn refresh<S: MarketSource>(
    source: &S,
    cfg: &FilterConfig,
) -> Result<ResultSet, PipelineError> {
    refresh_with_base(source, cfg, DEFAULT_MARKET_BASE_URL).await
}

/// Fetch from `source` and run the pipeline.
///
/// A fetch failure is logged and treated as an empty batch, so the caller
/// still gets the fallback output.
#[instrument(skip(source, cfg))]
pub async fn refresh_with_base<S: MarketSource>(
    source: &S,
    cfg: &FilterConfig,
    base_url: &str,
) -> Result<ResultSet, PipelineError> {
    let raw_markets = match source.fetch_markets().await {
        Ok(markets) => markets,
        Err(e) => {
            warn!(error = %e, "Market fetch failed, continuing with empty batch");
            metrics::inc_fetch_failures();
            Vec::new()
        }
    };

    let result = run_with_base(&raw_markets, cfg, base_url)?;
    info!(
        fetched = raw_markets.len(),
        published = result.total_count,
        tier = %result.tier,
        "Refreshed opportunities"
    );
    Ok(result)
}
