//! Threshold filtering, ordering, and the empty-result fallback policy.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use strum::Display;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use super::analyzer::{analyze, Opportunity};
use super::normalizer::normalize;
use crate::error::PipelineError;
use crate::market::sample_markets;
use crate::metrics;

/// Thresholds applied by [`filter_and_rank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterConfig {
    /// Lowest accepted `max_spread`.
    #[serde(with = "rust_decimal::serde::float")]
    pub min_spread: Decimal,
    /// Highest accepted `max_spread`.
    #[serde(with = "rust_decimal::serde::float")]
    pub max_spread: Decimal,
    /// Lowest accepted volume.
    #[serde(with = "rust_decimal::serde::float")]
    pub min_volume: Decimal,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_spread: dec!(0.015),
            max_spread: dec!(0.50),
            min_volume: dec!(50000),
        }
    }
}

impl FilterConfig {
    /// Reject negative thresholds and an inverted spread window.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.min_spread.is_sign_negative() {
            return Err(PipelineError::negative_threshold("min_spread", self.min_spread));
        }
        if self.max_spread.is_sign_negative() {
            return Err(PipelineError::negative_threshold("max_spread", self.max_spread));
        }
        if self.min_volume.is_sign_negative() {
            return Err(PipelineError::negative_threshold("min_volume", self.min_volume));
        }
        if self.min_spread > self.max_spread {
            return Err(PipelineError::InvalidFilter(format!(
                "min_spread {} exceeds max_spread {}",
                self.min_spread, self.max_spread
            )));
        }
        Ok(())
    }

    /// Whether an opportunity passes every threshold.
    pub fn accepts(&self, opp: &Opportunity) -> bool {
        opp.max_spread >= self.min_spread
            && opp.max_spread <= self.max_spread
            && opp.market.volume >= self.min_volume
            && opp.is_actionable()
    }
}

/// Which stage of the fallback policy produced a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FallbackTier {
    /// Opportunities passed the thresholds.
    Filtered,
    /// Nothing passed; every analyzed opportunity is returned.
    Relaxed,
    /// No input at all; embedded samples are returned.
    Synthetic,
}

/// Output of one pipeline run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSet {
    /// When the set was built.
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
    /// Number of opportunities.
    pub total_count: usize,
    /// Thresholds as configured, regardless of fallback.
    pub filters: FilterConfig,
    /// Opportunities in ascending `max_spread` order.
    pub opportunities: Vec<Opportunity>,
    /// Fallback stage that produced the set.
    #[serde(skip)]
    pub tier: FallbackTier,
}

impl ResultSet {
    fn new(filters: FilterConfig, opportunities: Vec<Opportunity>, tier: FallbackTier) -> Self {
        Self {
            generated_at: OffsetDateTime::now_utc(),
            total_count: opportunities.len(),
            filters,
            opportunities,
            tier,
        }
    }

    /// Whether the thresholds had to be dropped to produce output.
    pub fn is_fallback(&self) -> bool {
        self.tier != FallbackTier::Filtered
    }
}

fn sort_by_spread(opportunities: &mut [Opportunity]) {
    opportunities.sort_by(|a, b| a.max_spread.cmp(&b.max_spread));
}

/// Opportunities built from the embedded sample markets.
pub fn synthetic_opportunities() -> Vec<Opportunity> {
    sample_markets()
        .iter()
        .filter_map(|raw| normalize(raw).ok())
        .map(analyze)
        .collect()
}

/// Apply thresholds and order the survivors by ascending spread.
///
/// When nothing survives, falls back first to every input opportunity and,
/// if there is no input at all, to the embedded samples. Only an empty
/// sample set is an error.
pub fn filter_and_rank(
    opportunities: Vec<Opportunity>,
    cfg: &FilterConfig,
) -> Result<ResultSet, PipelineError> {
    let input_count = opportunities.len();

    let mut filtered: Vec<Opportunity> = opportunities
        .iter()
        .filter(|opp| cfg.accepts(opp))
        .cloned()
        .collect();

    let (mut selected, tier) = if !filtered.is_empty() {
        info!(
            kept = filtered.len(),
            input = input_count,
            min_spread = %cfg.min_spread,
            max_spread = %cfg.max_spread,
            min_volume = %cfg.min_volume,
            "Opportunities passed filters"
        );
        (std::mem::take(&mut filtered), FallbackTier::Filtered)
    } else if input_count > 0 {
        warn!(
            input = input_count,
            "No opportunities after filters, using all analyzed markets"
        );
        (opportunities, FallbackTier::Relaxed)
    } else {
        warn!("No markets to analyze, using embedded samples");
        let samples = synthetic_opportunities();
        if samples.is_empty() {
            return Err(PipelineError::NoData);
        }
        debug!(count = samples.len(), "Built sample opportunities");
        (samples, FallbackTier::Synthetic)
    };

    sort_by_spread(&mut selected);
    metrics::record_fallback_tier(tier);

    Ok(ResultSet::new(*cfg, selected, tier))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyzer::Side;
    use crate::analysis::classifier::Category;
    use crate::analysis::normalizer::NormalizedMarket;
    use crate::market::SAMPLE_COUNT;

    fn opp(id: &str, yes: Decimal, no: Decimal, volume: Decimal) -> Opportunity {
        analyze(NormalizedMarket {
            id: id.to_string(),
            question: format!("Market {id}"),
            slug: None,
            event_slug: None,
            category: Category::Other,
            yes_price: yes,
            no_price: no,
            volume,
            liquidity: Decimal::ZERO,
            updated_at: None,
            time_left_ms: 0,
            market_url: format!("https://polymarket.com/market/{id}"),
        })
    }

    fn ids(set: &ResultSet) -> Vec<&str> {
        set.opportunities.iter().map(|o| o.market.id.as_str()).collect()
    }

    #[test]
    fn default_thresholds() {
        let cfg = FilterConfig::default();
        assert_eq!(cfg.min_spread, dec!(0.015));
        assert_eq!(cfg.max_spread, dec!(0.50));
        assert_eq!(cfg.min_volume, dec!(50000));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_thresholds() {
        let inverted = FilterConfig { min_spread: dec!(0.3), max_spread: dec!(0.2), ..Default::default() };
        let negative = FilterConfig { min_volume: dec!(-1), ..Default::default() };

        assert!(matches!(inverted.validate(), Err(PipelineError::InvalidFilter(_))));
        assert!(matches!(negative.validate(), Err(PipelineError::InvalidFilter(_))));
    }

    #[test]
    fn keeps_only_markets_within_thresholds_sorted_ascending() {
        let input = vec![
            opp("wide", dec!(0.30), dec!(0.70), dec!(100000)),
            opp("tight", dec!(0.48), dec!(0.52), dec!(100000)),
            opp("too-tight", dec!(0.495), dec!(0.505), dec!(100000)),
            opp("thin", dec!(0.45), dec!(0.55), dec!(10)),
            opp("balanced", dec!(0.55), dec!(0.55), dec!(100000)),
            opp("mid", dec!(0.46), dec!(0.54), dec!(100000)),
        ];

        let set = filter_and_rank(input, &FilterConfig::default()).unwrap();

        assert_eq!(ids(&set), vec!["tight", "mid", "wide"]);
        assert_eq!(set.total_count, 3);
        assert_eq!(set.tier, FallbackTier::Filtered);
        assert!(!set.is_fallback());
    }

    #[test]
    fn threshold_bounds_are_inclusive() {
        let input = vec![
            opp("at-min", dec!(0.485), dec!(0.515), dec!(50000)),
            opp("at-max", dec!(0.0), dec!(1.0), dec!(50000)),
        ];

        let set = filter_and_rank(input, &FilterConfig::default()).unwrap();

        assert_eq!(ids(&set), vec!["at-min", "at-max"]);
    }

    #[test]
    fn balanced_market_is_excluded_even_when_wide() {
        let input = vec![
            opp("balanced", dec!(0.60), dec!(0.60), dec!(100000)),
            opp("ok", dec!(0.40), dec!(0.60), dec!(100000)),
        ];

        let set = filter_and_rank(input, &FilterConfig::default()).unwrap();

        assert_eq!(ids(&set), vec!["ok"]);
        assert!(set.opportunities.iter().all(|o| o.underpriced_side != Side::Balanced));
    }

    #[test]
    fn relaxed_fallback_returns_every_input_sorted() {
        let input = vec![
            opp("c", dec!(0.40), dec!(0.60), dec!(1)),
            opp("a", dec!(0.499), dec!(0.501), dec!(1_000_000)),
            opp("b", dec!(0.55), dec!(0.55), dec!(1_000_000)),
        ];
        let cfg = FilterConfig::default();

        let set = filter_and_rank(input, &cfg).unwrap();

        assert_eq!(set.tier, FallbackTier::Relaxed);
        assert_eq!(set.total_count, 3);
        assert_eq!(ids(&set), vec!["a", "b", "c"]);
        assert_eq!(set.filters, cfg);
    }

    #[test]
    fn synthetic_fallback_on_empty_input() {
        let set = filter_and_rank(Vec::new(), &FilterConfig::default()).unwrap();

        assert_eq!(set.tier, FallbackTier::Synthetic);
        assert_eq!(set.total_count, SAMPLE_COUNT);
        assert!(set.opportunities.iter().all(|o| o.market.id.starts_with("mock-")));
    }

    #[test]
    fn ties_keep_input_order() {
        let input = vec![
            opp("first", dec!(0.47), dec!(0.53), dec!(100000)),
            opp("second", dec!(0.53), dec!(0.47), dec!(100000)),
        ];

        let set = filter_and_rank(input, &FilterConfig::default()).unwrap();

        assert_eq!(ids(&set), vec!["first", "second"]);
    }

    #[test]
    fn output_is_sorted_for_every_tier() {
        let inputs = vec![
            vec![
                opp("x", dec!(0.10), dec!(0.90), dec!(60000)),
                opp("y", dec!(0.45), dec!(0.55), dec!(60000)),
            ],
            vec![opp("z", dec!(0.9), dec!(0.9), dec!(1)), opp("w", dec!(0.6), dec!(0.6), dec!(1))],
            Vec::new(),
        ];

        for input in inputs {
            let set = filter_and_rank(input, &FilterConfig::default()).unwrap();
            assert!(set
                .opportunities
                .windows(2)
                .all(|pair| pair[0].max_spread <= pair[1].max_spread));
        }
    }

    #[test]
    fn serializes_output_contract() {
        let set = filter_and_rank(
            vec![opp("t", dec!(0.48), dec!(0.52), dec!(2500000))],
            &FilterConfig::default(),
        )
        .unwrap();

        let value = serde_json::to_value(&set).unwrap();
        assert_eq!(value["totalCount"], 1);
        assert_eq!(value["filters"]["minSpread"], serde_json::json!(0.015));
        assert_eq!(value["filters"]["minVolume"], serde_json::json!(50000.0));
        assert!(value["generatedAt"].as_str().unwrap().contains('T'));
        assert!(value.get("tier").is_none());
        assert_eq!(value["opportunities"][0]["id"], "t");
    }
}
