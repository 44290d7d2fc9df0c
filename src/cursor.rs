//! A probe point whose true position is a feature vector.
//!
//! World space under a cursor is fixed: feature value `0` sits at `-R`, `1` at
//! `+R`. Unlike [`crate::normalize::RangeNormalizer`], this mapping does not
//! depend on the data, so the cursor keeps its feature values when the display
//! axes change and only its world position moves.

use crate::features::{Feature, FEATURE_COUNT};
use crate::pipeline::{Axis, DisplayAxes};
use glam::Vec3;

/// Feature value in `[0, 1]` to a world coordinate in `[-radius, radius]`.
pub fn feature_to_world(value: f32, radius: f32) -> f32 {
    (value - 0.5) * 2.0 * radius
}

/// World coordinate to a feature value, clamped to `[0, 1]`.
pub fn world_to_feature(coord: f32, radius: f32) -> f32 {
    (coord / (2.0 * radius) + 0.5).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureCursor {
    values: [f32; FEATURE_COUNT],
    radius: f32,
}

impl FeatureCursor {
    /// A cursor at the middle of every feature.
    pub fn new(radius: f32) -> Self {
        Self {
            values: [0.5; FEATURE_COUNT],
            radius,
        }
    }

    /// Current value of a feature.
    pub fn get(&self, feature: Feature) -> f32 {
        self.values[feature.index()]
    }

    /// Set a feature, clamped to `[0, 1]`.
    pub fn set(&mut self, feature: Feature, value: f32) {
        self.values[feature.index()] = value.clamp(0.0, 1.0);
    }

    /// World position under the given axis mapping.
    pub fn position(&self, axes: &DisplayAxes) -> Vec3 {
        Vec3::new(
            feature_to_world(self.get(axes.x), self.radius),
            feature_to_world(self.get(axes.y), self.radius),
            feature_to_world(self.get(axes.z), self.radius),
        )
    }

    /// Move the feature shown on `axis` by `delta`, staying within `[0, 1]`.
    /// Returns the new world position.
    pub fn nudge(&mut self, axes: &DisplayAxes, axis: Axis, delta: f32) -> Vec3 {
        let feature = axes.feature(axis);
        self.set(feature, self.get(feature) + delta);
        self.position(axes)
    }

    /// Write a world position back into the three mapped features. Used after a
    /// move that happened in world space.
    pub fn sync_from_world(&mut self, axes: &DisplayAxes, position: Vec3) {
        self.values[axes.x.index()] = world_to_feature(position.x, self.radius);
        self.values[axes.y.index()] = world_to_feature(position.y, self.radius);
        self.values[axes.z.index()] = world_to_feature(position.z, self.radius);
    }
}

impl Default for FeatureCursor {
    fn default() -> Self {
        Self::new(crate::normalize::DEFAULT_RADIUS)
    }
}
