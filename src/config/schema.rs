use crate::features::Feature;
use crate::hull::{DEFAULT_PADDING, MIN_HULL_MEMBERS};
use crate::normalize::DEFAULT_RADIUS;
use serde::Deserialize;

/// Top-level settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/trackspace/config.toml` or
/// `~/.config/trackspace/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `TRACKSPACE__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub clustering: ClusteringSettings,
    pub display: DisplaySettings,
    pub hull: HullSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClusteringSettings {
    /// Number of k-means clusters.
    pub clusters: usize,
    /// Cap on assignment rounds.
    pub max_iter: usize,
    /// Fixed seed for reproducible clustering. Unset means a fresh OS seed per run.
    pub seed: Option<u64>,
}

impl Default for ClusteringSettings {
    fn default() -> Self {
        Self {
            clusters: 6,
            max_iter: crate::cluster::DEFAULT_MAX_ITER,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Half-width of the display cube; positions land in `[-radius, radius]`.
    pub radius: f32,
    /// Features shown on each axis at startup.
    pub x: Feature,
    pub y: Feature,
    pub z: Feature,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS,
            x: Feature::Danceability,
            y: Feature::Energy,
            z: Feature::Valence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HullSettings {
    /// How far each member is pushed out from its cluster centroid (world units).
    pub padding: f32,
    /// Clusters smaller than this get no hull. Must be at least 4.
    pub min_members: usize,
}

impl Default for HullSettings {
    fn default() -> Self {
        Self {
            padding: DEFAULT_PADDING,
            min_members: MIN_HULL_MEMBERS,
        }
    }
}
