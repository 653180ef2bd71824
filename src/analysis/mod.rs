//! Market analysis core.
//!
//! Raw records flow one way through this module:
//! classify/normalize → analyze → filter and rank.

pub mod analyzer;
pub mod classifier;
pub mod normalizer;
pub mod ranking;

pub use analyzer::{analyze, signal_for_price, Opportunity, Side, Signal, FAIR_PRICE};
pub use classifier::{classify, Category, CategoryRule, CATEGORY_KEYWORDS, CATEGORY_RULES};
pub use normalizer::{normalize, normalize_with_base, NormalizedMarket, PriceSource};
pub use ranking::{filter_and_rank, synthetic_opportunities, FallbackTier, FilterConfig, ResultSet};
