//! Currency rounding and clock-time helpers.

use chrono::NaiveTime;
use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds an amount half-up to `scale` decimal places.
///
/// Amounts are computed exactly and rounded once per component total, never
/// per intermediate step.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::round_currency;
/// use rust_decimal::Decimal;
///
/// assert_eq!(round_currency(Decimal::new(12345, 3), 2), Decimal::new(1235, 2));
/// assert_eq!(round_currency(Decimal::new(12344, 3), 2), Decimal::new(1234, 2));
/// ```
pub fn round_currency(amount: Decimal, scale: u32) -> Decimal {
    amount.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}

/// Signed minutes from `from` to `to` on the same day.
pub(crate) fn minutes_between(from: NaiveTime, to: NaiveTime) -> Decimal {
    Decimal::new((to - from).num_seconds(), 0) / Decimal::new(60, 0)
}

/// Converts minutes to hours.
pub(crate) fn minutes_to_hours(minutes: Decimal) -> Decimal {
    minutes / Decimal::new(60, 0)
}
