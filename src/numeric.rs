//! Numeric conversion helpers used across the project.
//!
//! These utilities guard conversions between floating-point and integer
//! domains so that grid lookups never see a wrapped or saturated index
//! produced from a NaN or an infinite coordinate.

/// Truncate a world-space coordinate scaled by `spacing` to a grid index.
///
/// Truncation is towards zero, matching how grid cells were assigned when
/// the grid was built. Returns `None` for non-finite input, a non-positive
/// spacing, or a result outside the `i32` domain.
///
/// # Examples
///
/// ```
/// use mechwalk::numeric::truncate_to_cell;
/// assert_eq!(truncate_to_cell(7.9, 2.0), Some(3));
/// assert_eq!(truncate_to_cell(-3.5, 1.0), Some(-3));
/// assert_eq!(truncate_to_cell(f32::NAN, 1.0), None);
/// ```
#[expect(
    clippy::cast_possible_truncation,
    reason = "The value is range-checked against i32 before casting."
)]
#[must_use]
pub fn truncate_to_cell(value: f32, spacing: f32) -> Option<i32> {
    if !value.is_finite() || !spacing.is_finite() || spacing <= 0.0 {
        return None;
    }
    let scaled = f64::from(value) / f64::from(spacing);
    let truncated = scaled.trunc();
    if truncated < f64::from(i32::MIN) || truncated > f64::from(i32::MAX) {
        return None;
    }
    Some(truncated as i32)
}

/// Scale a grid index back into world space.
#[expect(
    clippy::cast_precision_loss,
    reason = "Grid indices stay far below the 2^24 limit of exact f32 integers."
)]
#[must_use]
pub fn cell_to_world(index: i32, spacing: f32) -> f32 {
    index as f32 * spacing
}

/// Convert a leg count into `f32` for angle arithmetic.
#[expect(
    clippy::cast_precision_loss,
    reason = "Leg counts are bounded by MAX_LEG_COUNT."
)]
#[must_use]
pub fn count_to_f32(count: usize) -> f32 {
    count as f32
}
