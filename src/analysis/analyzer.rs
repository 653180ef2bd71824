//! Spread and signal derivation for normalized markets.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use strum::{Display, EnumString};

use super::normalizer::NormalizedMarket;

/// Fair value of a binary outcome.
pub const FAIR_PRICE: Decimal = dec!(0.5);

const STRONG_BUY_BELOW: Decimal = dec!(0.48);
const BUY_BELOW: Decimal = dec!(0.49);
const STRONG_SELL_ABOVE: Decimal = dec!(0.51);
const SELL_ABOVE: Decimal = dec!(0.50);

/// Which outcome trades below fair value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Side {
    /// YES trades below 0.50.
    Yes,
    /// NO trades below 0.50 and YES does not.
    No,
    /// Neither side trades below 0.50.
    Balanced,
}

/// Discrete recommendation bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    StrongBuy,
    Buy,
    Sell,
    StrongSell,
    Neutral,
}

impl Signal {
    /// Human-readable label ("STRONG BUY").
    pub fn label(&self) -> &'static str {
        match self {
            Signal::StrongBuy => "STRONG BUY",
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::StrongSell => "STRONG SELL",
            Signal::Neutral => "NEUTRAL",
        }
    }
}

/// Map a price to its signal bucket.
pub fn signal_for_price(price: Decimal) -> Signal {
    if price < STRONG_BUY_BELOW {
        Signal::StrongBuy
    } else if price < BUY_BELOW {
        Signal::Buy
    } else if price > STRONG_SELL_ABOVE {
        Signal::StrongSell
    } else if price > SELL_ABOVE {
        Signal::Sell
    } else {
        Signal::Neutral
    }
}

/// A normalized market with its derived mispricing signals.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    /// The underlying market.
    #[serde(flatten)]
    pub market: NormalizedMarket,
    /// |yes - 0.5|
    #[serde(with = "rust_decimal::serde::float")]
    pub yes_spread: Decimal,
    /// |no - 0.5|
    #[serde(with = "rust_decimal::serde::float")]
    pub no_spread: Decimal,
    /// Larger of the two spreads.
    #[serde(with = "rust_decimal::serde::float")]
    pub max_spread: Decimal,
    /// Side trading below fair value.
    pub underpriced_side: Side,
    /// Price the signal is read from. For `Balanced` this is the NO price
    /// and carries no meaning of its own.
    #[serde(with = "rust_decimal::serde::float")]
    pub underpriced_price: Decimal,
    /// Recommendation bucket.
    pub signal: Signal,
}

impl Opportunity {
    /// Whether one side trades below fair value.
    pub fn is_actionable(&self) -> bool {
        self.underpriced_side != Side::Balanced
    }
}

/// Distance from fair value; saturates rather than overflowing.
fn spread(price: Decimal) -> Decimal {
    price
        .checked_sub(FAIR_PRICE)
        .map(|d| d.abs())
        .unwrap_or(Decimal::MAX)
}

/// Derive spreads, underpriced side and signal.
pub fn analyze(market: NormalizedMarket) -> Opportunity {
    let yes_spread = spread(market.yes_price);
    let no_spread = spread(market.no_price);
    let max_spread = yes_spread.max(no_spread);

    let (underpriced_side, underpriced_price) = if market.yes_price < FAIR_PRICE {
        (Side::Yes, market.yes_price)
    } else if market.no_price < FAIR_PRICE {
        (Side::No, market.no_price)
    } else {
        (Side::Balanced, market.no_price)
    };

    Opportunity {
        yes_spread,
        no_spread,
        max_spread,
        underpriced_side,
        underpriced_price,
        signal: signal_for_price(underpriced_price),
        market,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::classifier::Category;

    fn market(yes: Decimal, no: Decimal) -> NormalizedMarket {
        NormalizedMarket {
            id: "m".to_string(),
            question: "Test market".to_string(),
            slug: None,
            event_slug: None,
            category: Category::Other,
            yes_price: yes,
            no_price: no,
            volume: dec!(100000),
            liquidity: dec!(1000),
            updated_at: None,
            time_left_ms: 0,
            market_url: "https://polymarket.com/market/m".to_string(),
        }
    }

    #[test]
    fn constants_match_cut_points() {
        assert_eq!(FAIR_PRICE, dec!(0.5));
        assert_eq!(STRONG_BUY_BELOW, dec!(0.48));
        assert_eq!(BUY_BELOW, dec!(0.49));
        assert_eq!(SELL_ABOVE, dec!(0.50));
        assert_eq!(STRONG_SELL_ABOVE, dec!(0.51));
    }

    #[test]
    fn signal_boundaries_are_exact() {
        assert_eq!(signal_for_price(dec!(0.4799)), Signal::StrongBuy);
        assert_eq!(signal_for_price(dec!(0.48)), Signal::Buy);
        assert_eq!(signal_for_price(dec!(0.4899)), Signal::Buy);
        assert_eq!(signal_for_price(dec!(0.49)), Signal::Neutral);
        assert_eq!(signal_for_price(dec!(0.50)), Signal::Neutral);
        assert_eq!(signal_for_price(dec!(0.5001)), Signal::Sell);
        assert_eq!(signal_for_price(dec!(0.51)), Signal::Sell);
        assert_eq!(signal_for_price(dec!(0.5101)), Signal::StrongSell);
    }

    #[test]
    fn yes_side_underpriced() {
        let opp = analyze(market(dec!(0.48), dec!(0.52)));

        assert_eq!(opp.yes_spread, dec!(0.02));
        assert_eq!(opp.no_spread, dec!(0.02));
        assert_eq!(opp.max_spread, dec!(0.02));
        assert_eq!(opp.underpriced_side, Side::Yes);
        assert_eq!(opp.underpriced_price, dec!(0.48));
        assert_eq!(opp.signal, Signal::Buy);
        assert!(opp.is_actionable());
    }

    #[test]
    fn no_side_underpriced() {
        let opp = analyze(market(dec!(0.7), dec!(0.3)));

        assert_eq!(opp.max_spread, dec!(0.2));
        assert_eq!(opp.underpriced_side, Side::No);
        assert_eq!(opp.signal, Signal::StrongBuy);
    }

    #[test]
    fn balanced_when_both_at_or_above_fair() {
        for (yes, no) in [(dec!(0.5), dec!(0.5)), (dec!(0.55), dec!(0.52)), (dec!(0.5), dec!(0.9))] {
            let opp = analyze(market(yes, no));
            assert_eq!(opp.underpriced_side, Side::Balanced);
            assert!(!opp.is_actionable());
        }
    }

    #[test]
    fn balanced_signal_reads_no_price() {
        let opp = analyze(market(dec!(0.55), dec!(0.505)));
        assert_eq!(opp.signal, Signal::Sell);

        let opp = analyze(market(dec!(0.55), dec!(0.52)));
        assert_eq!(opp.signal, Signal::StrongSell);
    }

    #[test]
    fn max_spread_uses_the_wider_side() {
        // Prices need not sum to one.
        let opp = analyze(market(dec!(0.45), dec!(0.20)));
        assert_eq!(opp.yes_spread, dec!(0.05));
        assert_eq!(opp.no_spread, dec!(0.30));
        assert_eq!(opp.max_spread, dec!(0.30));
        assert_eq!(opp.underpriced_side, Side::Yes);
    }

    #[test]
    fn extreme_prices_saturate_instead_of_panicking() {
        let opp = analyze(market(Decimal::MIN, dec!(0.4)));
        assert_eq!(opp.yes_spread, Decimal::MAX);
        assert_eq!(opp.max_spread, Decimal::MAX);
        assert_eq!(opp.underpriced_side, Side::Yes);
    }

    #[test]
    fn serializes_flat_with_upper_case_enums() {
        let opp = analyze(market(dec!(0.48), dec!(0.52)));
        let value = serde_json::to_value(&opp).unwrap();

        assert_eq!(value["id"], "m");
        assert_eq!(value["maxSpread"], serde_json::json!(0.02));
        assert_eq!(value["underpricedSide"], "YES");
        assert_eq!(value["signal"], "BUY");
        assert_eq!(Signal::StrongBuy.to_string(), "STRONG_BUY");
        assert_eq!(Signal::StrongBuy.label(), "STRONG BUY");
    }
}
