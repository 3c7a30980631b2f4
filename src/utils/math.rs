//! Rounding and clipping helpers shared by the topology and the episode.

/// Rounds to the nearest integer, ties to even.
///
/// Every filter count in the crate is rounded through this function, so
/// `round_half_even(2.5) == 2.0` and `round_half_even(3.5) == 4.0`.
#[inline]
pub fn round_half_even(value: f64) -> f64 {
    value.round_ties_even()
}

/// Clips `value` into `[lo, hi]` as `min(max(value, lo), hi)`.
///
/// Unlike [`f64::clamp`] this never panics: when `lo > hi` the upper side
/// wins. A NaN `value` stays NaN.
#[inline]
pub fn clip(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        return value;
    }
    value.max(lo).min(hi)
}

/// Width kept when a layer of `width` channels is pruned to `ratio`.
///
/// May be zero for very small ratios; callers that commit a width must
/// floor it at one themselves.
#[inline]
pub fn scaled_width(width: usize, ratio: f64) -> usize {
    let rounded = round_half_even(width as f64 * ratio);
    if rounded <= 0.0 {
        0
    } else {
        rounded as usize
    }
}
