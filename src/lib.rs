//! Clustering and layout core for exploring a music catalogue in 3D.
//!
//! `trackspace` turns catalogue records into a renderable [`Snapshot`]:
//! - [`features`]: nine normalized audio features per track
//! - [`cluster`]: k-means (k-means++ seeding, Lloyd iterations) over those vectors
//! - [`normalize`]: per-axis rescaling onto a symmetric display range
//! - [`hull`]: padded convex hulls enclosing each cluster
//! - [`pipeline`]: the pass that ties them together and re-lays out on axis changes
//!
//! Rendering, input handling and audio playback are left to the consumer.
//!
//! ```rust
//! use trackspace::{parse_catalog, DisplayAxes, Feature, Pipeline, Settings};
//!
//! let json = r#"[
//!   { "track_info": { "name": "Calm" },  "audio_features": { "energy": 0.1, "tempo": 70 } },
//!   { "track_info": { "name": "Drift" }, "audio_features": { "energy": 0.2, "tempo": 75 } },
//!   { "track_info": { "name": "Rush" },  "audio_features": { "energy": 0.9, "tempo": 170 } },
//!   { "track_info": { "name": "Surge" }, "audio_features": { "energy": 0.95, "tempo": 175 } }
//! ]"#;
//!
//! let mut settings = Settings::default();
//! settings.clustering.clusters = 2;
//! settings.clustering.seed = Some(7);
//!
//! let mut pipeline = Pipeline::run(parse_catalog(json).unwrap(), &settings).unwrap();
//! let labels = pipeline.assignments().to_vec();
//! assert_eq!(labels[0], labels[1]);
//! assert_ne!(labels[0], labels[2]);
//!
//! let snapshot = pipeline.set_display_axes(DisplayAxes::new(
//!     Feature::Energy,
//!     Feature::Tempo,
//!     Feature::Danceability,
//! ));
//! assert_eq!(snapshot.tracks[3].position.x, 25.0);
//! assert_eq!(pipeline.assignments(), labels.as_slice());
//! ```

#![forbid(unsafe_code)]

pub mod catalog;
pub mod cluster;
pub mod config;
pub mod cursor;
pub mod error;
pub mod features;
pub mod hull;
pub mod normalize;
pub mod pipeline;

#[cfg(feature = "fetch")]
pub use catalog::fetch_catalog;
pub use catalog::{load_catalog, parse_catalog, read_catalog, TrackMeta, TrackRecord};
pub use cluster::{Clustering, Kmeans, KmeansFit};
pub use crate::config::Settings;
pub use cursor::FeatureCursor;
pub use error::{Error, Result};
pub use features::{Feature, FeatureVector, FeatureVectorBuilder, FEATURE_COUNT};
pub use hull::{ClusterHullBuilder, Color, ConvexHull, HullError};
pub use normalize::{AxisRange, RangeNormalizer};
pub use pipeline::{
    snapshot_or_empty, Axis, ClusterRegion, DisplayAxes, Pipeline, PlacedTrack, Snapshot,
};
