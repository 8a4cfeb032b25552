//! Numeric conversion helpers centralizing safe score and clock arithmetic.

use num_traits::cast::cast;

/// Apply a signed delta to an unsigned bucket, clamping at zero and `u32::MAX`.
#[must_use]
pub fn apply_delta(value: u32, delta: i64) -> u32 {
    let widened = i64::from(value).saturating_add(delta);
    let clamped = widened.clamp(0, i64::from(u32::MAX));
    cast::<i64, u32>(clamped).unwrap_or(0)
}

/// Subtract `amount` from `value`, flooring at zero.
#[must_use]
pub const fn subtract_clamped(value: u32, amount: u32) -> u32 {
    value.saturating_sub(amount)
}

/// Sum per-round buckets into a single score without overflowing.
#[must_use]
pub fn sum_buckets(buckets: &[u32]) -> u32 {
    buckets
        .iter()
        .fold(0_u32, |acc, value| acc.saturating_add(*value))
}
