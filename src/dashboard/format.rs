//! Display formatters for dashboard values.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use time::OffsetDateTime;

use crate::analysis::Signal;

const MS_PER_HOUR: i64 = 60 * 60 * 1000;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Whole number with comma thousands separators ("50,000").
pub fn format_integer(value: Decimal) -> String {
    let rounded = round_half_up(value, 0);
    let digits = rounded.abs().trunc().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Compact volume/liquidity figure: "2.5M", "75.0K", "950".
pub fn format_number(value: Decimal) -> String {
    if value >= dec!(1_000_000) {
        format!("{:.1}M", round_half_up(value / dec!(1_000_000), 1))
    } else if value >= dec!(1_000) {
        format!("{:.1}K", round_half_up(value / dec!(1_000), 1))
    } else {
        format_integer(value)
    }
}

/// Fraction as a percentage with `dp` decimals.
pub fn format_percent_dp(value: Decimal, dp: u32) -> String {
    format!("{:.*}%", dp as usize, round_half_up(value * dec!(100), dp))
}

/// Fraction as a percentage with two decimals ("48.00%").
pub fn format_percent(value: Decimal) -> String {
    format_percent_dp(value, 2)
}

/// Remaining time as "Xd Yh" or "Yh"; "Ended" when nothing is left.
pub fn format_time_left(ms: i64) -> String {
    if ms <= 0 {
        return "Ended".to_string();
    }
    let days = ms / MS_PER_DAY;
    let hours = (ms % MS_PER_DAY) / MS_PER_HOUR;
    if days > 0 {
        format!("{days}d {hours}h")
    } else {
        format!("{hours}h")
    }
}

/// Age of a timestamp relative to `now`.
pub fn format_time_ago(at: OffsetDateTime, now: OffsetDateTime) -> String {
    let minutes = (now - at).whole_minutes();
    if minutes < 1 {
        return "Just now".to_string();
    }
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }
    format!("{}d ago", hours / 24)
}

/// Badge text for a signal.
pub fn signal_label(signal: Signal) -> &'static str {
    signal.label()
}
