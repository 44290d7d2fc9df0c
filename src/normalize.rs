//! Per-axis rescaling onto the symmetric display interval `[-R, R]`.

use serde::{Deserialize, Serialize};

/// Default display half-width in world units.
pub const DEFAULT_RADIUS: f32 = 25.0;

/// Linear map from `[in_min, in_max]` to `[out_min, out_max]`.
///
/// A degenerate input interval maps everything to the output midpoint.
pub fn map_to_range(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    if in_max == in_min {
        return (out_min + out_max) / 2.0;
    }
    (value - in_min) / (in_max - in_min) * (out_max - out_min) + out_min
}

/// Observed extent of one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub min: f32,
    pub max: f32,
}

impl AxisRange {
    /// Extent of `values`, or `None` when there are none.
    pub fn of(values: &[f32]) -> Option<Self> {
        let (&first, rest) = values.split_first()?;
        Some(rest.iter().fold(
            Self {
                min: first,
                max: first,
            },
            |r, &v| Self {
                min: r.min.min(v),
                max: r.max.max(v),
            },
        ))
    }

    /// Whether every observed value was the same.
    pub fn is_degenerate(&self) -> bool {
        self.max == self.min
    }

    /// Where `value` sits between `min` (0%) and `max` (100%). A degenerate
    /// range reports 50%.
    pub fn percent_of_range(&self, value: f32) -> f32 {
        map_to_range(value, self.min, self.max, 0.0, 100.0)
    }
}

/// Rescales one axis at a time onto `[-radius, radius]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeNormalizer {
    radius: f32,
}

impl Default for RangeNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_RADIUS)
    }
}

impl RangeNormalizer {
    /// Normalizer onto `[-radius, radius]`.
    pub fn new(radius: f32) -> Self {
        Self { radius }
    }

    /// Display half-width.
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Map a single value given an already computed range.
    pub fn apply(&self, range: AxisRange, value: f32) -> f32 {
        map_to_range(value, range.min, range.max, -self.radius, self.radius)
    }

    /// Normalize `values` against their own extent.
    ///
    /// Returns the rescaled values and the range that was used; the range is
    /// `None` only for empty input.
    pub fn normalize(&self, values: &[f32]) -> (Vec<f32>, Option<AxisRange>) {
        let Some(range) = AxisRange::of(values) else {
            return (Vec::new(), None);
        };
        let out = values.iter().map(|&v| self.apply(range, v)).collect();
        (out, Some(range))
    }
}
