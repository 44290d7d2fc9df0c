//! One pass from catalogue records to a renderable [`Snapshot`].
//!
//! ```text
//! records ─► FeatureVectorBuilder ─► Kmeans (once) ─► labels
//!                                                       │
//! display axes ─► RangeNormalizer (per axis) ─► positions ─► ClusterHullBuilder
//! ```
//!
//! Clustering always uses all nine canonical features and runs once per
//! [`Pipeline`]. Changing the display axes with [`Pipeline::set_display_axes`]
//! recomputes positions and hulls only; filtering the catalogue with
//! [`Pipeline::filtered`] builds a new pipeline and clusters again.
//!
//! Every layout produces a fresh [`Snapshot`] behind an [`Arc`]. A reader
//! holding an older snapshot keeps a consistent view; nothing is mutated in
//! place.

use crate::catalog::{TrackMeta, TrackRecord};
use crate::cluster::{Kmeans, KmeansFit};
use crate::config::{DisplaySettings, Settings};
use crate::error::Result;
use crate::features::{Feature, FeatureVector, FeatureVectorBuilder};
use crate::hull::{cluster_color, ClusterHullBuilder, Color, ConvexHull};
use crate::normalize::{AxisRange, RangeNormalizer};
use glam::Vec3;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A spatial display dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Which feature is shown on each spatial axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayAxes {
    pub x: Feature,
    pub y: Feature,
    pub z: Feature,
}

impl DisplayAxes {
    /// Axes showing `x`, `y` and `z` features respectively.
    pub fn new(x: Feature, y: Feature, z: Feature) -> Self {
        Self { x, y, z }
    }

    /// Axes from feature names, as sent by an axis picker.
    pub fn parse(x: &str, y: &str, z: &str) -> Result<Self> {
        Ok(Self::new(x.parse()?, y.parse()?, z.parse()?))
    }

    /// Feature shown on `axis`.
    pub fn feature(&self, axis: Axis) -> Feature {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Features in x, y, z order.
    pub fn features(&self) -> [Feature; 3] {
        [self.x, self.y, self.z]
    }
}

impl Default for DisplayAxes {
    fn default() -> Self {
        Self::from(&DisplaySettings::default())
    }
}

impl From<&DisplaySettings> for DisplayAxes {
    fn from(s: &DisplaySettings) -> Self {
        Self::new(s.x, s.y, s.z)
    }
}

/// One track as placed in display space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedTrack {
    pub position: Vec3,
    pub cluster: usize,
    /// Index of the record in the input handed to the pipeline.
    pub source_index: usize,
    pub meta: TrackMeta,
}

/// A cluster's enclosing region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterRegion {
    pub color: Color,
    pub members: usize,
    pub hull: ConvexHull,
}

/// Everything a renderer needs for one frame of the catalogue view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// `None` only for the empty snapshot.
    pub axes: Option<DisplayAxes>,
    pub radius: f32,
    /// Eligible tracks, in input order.
    pub tracks: Vec<PlacedTrack>,
    /// Clusters that received a hull. Missing ids had none.
    pub regions: BTreeMap<usize, ClusterRegion>,
    /// Observed range of each displayed feature before rescaling.
    pub ranges: BTreeMap<Feature, AxisRange>,
}

impl Snapshot {
    /// Whether the snapshot has no tracks.
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Observed range of a displayed feature, `None` if not displayed.
    pub fn range(&self, feature: Feature) -> Option<AxisRange> {
        self.ranges.get(&feature).copied()
    }

    /// Percentage of the displayed range that `value` covers, for readouts.
    pub fn percent_of_range(&self, feature: Feature, value: f32) -> Option<f32> {
        self.range(feature).map(|r| r.percent_of_range(value))
    }

    /// Hull region of a cluster, if it got one.
    pub fn region(&self, cluster: usize) -> Option<&ClusterRegion> {
        self.regions.get(&cluster)
    }

    /// Colour for a cluster, whether or not it has a hull.
    pub fn color(&self, cluster: usize) -> Color {
        cluster_color(cluster)
    }
}

/// Clustering state for one catalogue plus the current layout.
#[derive(Debug, Clone)]
pub struct Pipeline {
    settings: Settings,
    records: Vec<TrackRecord>,
    source_indices: Vec<usize>,
    vectors: Vec<FeatureVector>,
    clustering: KmeansFit,
    axes: DisplayAxes,
    snapshot: Arc<Snapshot>,
}

impl Pipeline {
    /// Run the full pipeline. Clustering uses `settings.clustering.seed` when
    /// set, otherwise a fresh OS-seeded generator.
    pub fn run(records: Vec<TrackRecord>, settings: &Settings) -> Result<Self> {
        match settings.clustering.seed {
            Some(seed) => Self::run_with_rng(records, settings, &mut StdRng::seed_from_u64(seed)),
            None => Self::run_with_rng(records, settings, &mut rand::rng()),
        }
    }

    /// Run the full pipeline drawing clustering randomness from `rng`.
    pub fn run_with_rng<R: Rng + ?Sized>(
        records: Vec<TrackRecord>,
        settings: &Settings,
        rng: &mut R,
    ) -> Result<Self> {
        Self::build(records.into_iter().enumerate().collect(), settings, rng)
    }

    fn build<R: Rng + ?Sized>(
        indexed: Vec<(usize, TrackRecord)>,
        settings: &Settings,
        rng: &mut R,
    ) -> Result<Self> {
        settings.validate()?;

        let total = indexed.len();
        let (source_indices, records): (Vec<usize>, Vec<TrackRecord>) =
            indexed.into_iter().filter(|(_, r)| r.is_eligible()).unzip();
        if records.len() < total {
            debug!(dropped = total - records.len(), "skipped records without features or metadata");
        }

        let builder = FeatureVectorBuilder::new();
        let vectors: Vec<FeatureVector> = records.iter().map(|r| builder.build(r)).collect();

        let clustering = Kmeans::new(settings.clustering.clusters)
            .with_max_iter(settings.clustering.max_iter)
            .fit_with_rng(&vectors, rng)?;

        info!(
            tracks = vectors.len(),
            clusters = settings.clustering.clusters,
            iterations = clustering.iterations,
            converged = clustering.converged,
            "clustered catalogue"
        );

        let axes = DisplayAxes::from(&settings.display);
        let mut pipeline = Self {
            settings: settings.clone(),
            records,
            source_indices,
            vectors,
            clustering,
            axes,
            snapshot: Arc::new(Snapshot::default()),
        };
        pipeline.snapshot = Arc::new(pipeline.layout(axes));
        Ok(pipeline)
    }

    /// Switch the features shown on x/y/z. Cluster labels are untouched.
    pub fn set_display_axes(&mut self, axes: DisplayAxes) -> Arc<Snapshot> {
        debug!(x = %axes.x, y = %axes.y, z = %axes.z, "display axes changed");
        self.axes = axes;
        self.snapshot = Arc::new(self.layout(axes));
        Arc::clone(&self.snapshot)
    }

    /// Keep the records matching `predicate` and re-run everything, clustering
    /// included. `source_index` values keep pointing into the original input.
    pub fn filtered<F>(&self, predicate: F) -> Result<Self>
    where
        F: FnMut(&TrackRecord) -> bool,
    {
        match self.settings.clustering.seed {
            Some(seed) => self.filtered_with_rng(predicate, &mut StdRng::seed_from_u64(seed)),
            None => self.filtered_with_rng(predicate, &mut rand::rng()),
        }
    }

    /// [`Pipeline::filtered`] drawing clustering randomness from `rng`.
    pub fn filtered_with_rng<F, R>(&self, mut predicate: F, rng: &mut R) -> Result<Self>
    where
        F: FnMut(&TrackRecord) -> bool,
        R: Rng + ?Sized,
    {
        let subset = self
            .source_indices
            .iter()
            .zip(&self.records)
            .filter(|(_, r)| predicate(*r))
            .map(|(&i, r)| (i, r.clone()))
            .collect();
        let mut settings = self.settings.clone();
        settings.display = DisplaySettings {
            x: self.axes.x,
            y: self.axes.y,
            z: self.axes.z,
            ..settings.display
        };
        Self::build(subset, &settings, rng)
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot)
    }

    /// Features currently shown on x/y/z.
    pub fn axes(&self) -> DisplayAxes {
        self.axes
    }

    /// Cluster id per eligible record, in input order.
    pub fn assignments(&self) -> &[usize] {
        &self.clustering.labels
    }

    /// Final centroid per cluster, in feature space.
    pub fn centroids(&self) -> &[Vec<f32>] {
        &self.clustering.centroids
    }

    /// The full k-means result.
    pub fn clustering(&self) -> &KmeansFit {
        &self.clustering
    }

    /// Feature vector per eligible record, in input order.
    pub fn vectors(&self) -> &[FeatureVector] {
        &self.vectors
    }

    /// Eligible records, in input order.
    pub fn records(&self) -> &[TrackRecord] {
        &self.records
    }

    /// Settings the pipeline was built with.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn layout(&self, axes: DisplayAxes) -> Snapshot {
        let normalizer = RangeNormalizer::new(self.settings.display.radius);
        let mut ranges = BTreeMap::new();

        let [xs, ys, zs] = axes.features().map(|feature| {
            let column: Vec<f32> = self.vectors.iter().map(|v| v[feature]).collect();
            let (scaled, range) = normalizer.normalize(&column);
            if let Some(range) = range {
                ranges.insert(feature, range);
            }
            scaled
        });

        let tracks: Vec<PlacedTrack> = (0..self.vectors.len())
            .map(|i| PlacedTrack {
                position: Vec3::new(xs[i], ys[i], zs[i]),
                cluster: self.clustering.labels[i],
                source_index: self.source_indices[i],
                meta: self.records[i].meta(),
            })
            .collect();

        let k = self.clustering.centroids.len();
        let mut members: Vec<Vec<Vec3>> = vec![Vec::new(); k];
        for t in &tracks {
            members[t.cluster].push(t.position);
        }

        let hulls = ClusterHullBuilder::new(self.settings.hull.padding)
            .with_min_members(self.settings.hull.min_members);
        let regions = members
            .iter()
            .enumerate()
            .filter_map(|(cluster, points)| {
                hulls.build(cluster, points).map(|hull| {
                    (
                        cluster,
                        ClusterRegion {
                            color: cluster_color(cluster),
                            members: points.len(),
                            hull,
                        },
                    )
                })
            })
            .collect();

        Snapshot {
            axes: Some(axes),
            radius: normalizer.radius(),
            tracks,
            regions,
            ranges,
        }
    }
}

/// Snapshot for a load result. Any failure, whether loading or running the
/// pipeline, yields the empty snapshot so the consumer can show an empty state.
pub fn snapshot_or_empty(loaded: Result<Vec<TrackRecord>>, settings: &Settings) -> Arc<Snapshot> {
    match loaded.and_then(|records| Pipeline::run(records, settings)) {
        Ok(pipeline) => pipeline.snapshot(),
        Err(e) => {
            warn!(error = %e, "catalogue unavailable, showing empty view");
            Arc::new(Snapshot::default())
        }
    }
}
