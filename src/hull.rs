//! Padded convex hulls that enclose each cluster in display space.
//!
//! [`ConvexHull::new`] is an incremental 3D hull: it seeds a tetrahedron from
//! four extreme points, then inserts the remaining points one at a time. For each
//! point outside the current hull it removes every face the point can see and
//! stitches the horizon to the new point. All faces are kept wound
//! counter-clockwise when viewed from outside.
//!
//! Clusters are wrapped loosely: [`ClusterHullBuilder`] pushes every member
//! outward from the cluster centroid by a fixed padding before building.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};

/// Why a hull could not be built.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HullError {
    /// Fewer than four input points.
    #[error("convex hull needs at least 4 points, got {found}")]
    TooFewPoints {
        /// Number of points supplied.
        found: usize,
    },

    /// The points do not span three dimensions.
    #[error("degenerate input: points are {0}")]
    Degenerate(&'static str),
}

/// A closed triangulated polyhedron.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvexHull {
    /// Hull vertices.
    pub vertices: Vec<Vec3>,
    /// Triangles indexing into `vertices`, wound counter-clockwise from outside.
    pub faces: Vec<[usize; 3]>,
}

#[derive(Debug, Clone, Copy)]
struct Face {
    v: [usize; 3],
    normal: Vec3,
    offset: f32,
}

impl Face {
    fn new(points: &[Vec3], a: usize, b: usize, c: usize, interior: Vec3) -> Self {
        let mut face = Self::raw(points, a, b, c);
        if face.distance(interior) > 0.0 {
            face = Self::raw(points, a, c, b);
        }
        face
    }

    fn raw(points: &[Vec3], a: usize, b: usize, c: usize) -> Self {
        let normal = (points[b] - points[a])
            .cross(points[c] - points[a])
            .normalize_or_zero();
        Self {
            v: [a, b, c],
            normal,
            offset: normal.dot(points[a]),
        }
    }

    fn distance(&self, p: Vec3) -> f32 {
        self.normal.dot(p) - self.offset
    }

    fn edges(&self) -> [(usize, usize); 3] {
        let [a, b, c] = self.v;
        [(a, b), (b, c), (c, a)]
    }
}

impl ConvexHull {
    /// Build the convex hull of `points`.
    pub fn new(points: &[Vec3]) -> Result<Self, HullError> {
        if points.len() < 4 {
            return Err(HullError::TooFewPoints {
                found: points.len(),
            });
        }

        let eps = tolerance(points);
        let [a, b, c, d] = initial_simplex(points, eps)?;
        let interior = (points[a] + points[b] + points[c] + points[d]) / 4.0;

        let mut faces = vec![
            Face::new(points, a, b, c, interior),
            Face::new(points, a, b, d, interior),
            Face::new(points, a, c, d, interior),
            Face::new(points, b, c, d, interior),
        ];

        for (i, &p) in points.iter().enumerate() {
            if i == a || i == b || i == c || i == d {
                continue;
            }

            let (visible, kept): (Vec<Face>, Vec<Face>) =
                faces.into_iter().partition(|f| f.distance(p) > eps);
            faces = kept;
            if visible.is_empty() {
                continue;
            }

            // Visible-face order, never hash order: faces must come out the same
            // for identical input.
            let edges: Vec<(usize, usize)> = visible.iter().flat_map(|f| f.edges()).collect();
            let lookup: HashSet<(usize, usize)> = edges.iter().copied().collect();
            for &(u, v) in &edges {
                if !lookup.contains(&(v, u)) {
                    faces.push(Face::new(points, u, v, i, interior));
                }
            }
        }

        Ok(Self::compact(points, &faces))
    }

    /// Drop points not on the hull and renumber faces.
    fn compact(points: &[Vec3], faces: &[Face]) -> Self {
        let mut remap = vec![usize::MAX; points.len()];
        let mut vertices = Vec::new();
        let mut out = Vec::with_capacity(faces.len());
        for face in faces {
            let mut tri = [0usize; 3];
            for (slot, &idx) in tri.iter_mut().zip(&face.v) {
                if remap[idx] == usize::MAX {
                    remap[idx] = vertices.len();
                    vertices.push(points[idx]);
                }
                *slot = remap[idx];
            }
            out.push(tri);
        }
        Self {
            vertices,
            faces: out,
        }
    }

    /// Corner positions of every face.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.faces
            .iter()
            .map(|f| [self.vertices[f[0]], self.vertices[f[1]], self.vertices[f[2]]])
    }

    /// Outward unit normal of face `i`.
    pub fn normal(&self, i: usize) -> Vec3 {
        let [a, b, c] = self.triangles().nth(i).unwrap_or([Vec3::ZERO; 3]);
        (b - a).cross(c - a).normalize_or_zero()
    }

    /// Unique undirected edges, for wireframe outlines.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut set: Vec<(usize, usize)> = self
            .faces
            .iter()
            .flat_map(|&[a, b, c]| [(a, b), (b, c), (c, a)])
            .map(|(u, v)| (u.min(v), u.max(v)))
            .collect();
        set.sort_unstable();
        set.dedup();
        set
    }

    /// Whether `p` lies inside or on the hull, within `tolerance`.
    pub fn contains(&self, p: Vec3, tolerance: f32) -> bool {
        (0..self.faces.len()).all(|i| {
            let a = self.vertices[self.faces[i][0]];
            self.normal(i).dot(p - a) <= tolerance
        })
    }
}

/// Distance tolerance scaled to the magnitude of the input.
fn tolerance(points: &[Vec3]) -> f32 {
    let extent = points
        .iter()
        .fold(Vec3::ZERO, |m, p| m.max(p.abs()))
        .element_sum();
    (extent * f32::EPSILON * 16.0).max(1e-6)
}

fn initial_simplex(points: &[Vec3], eps: f32) -> Result<[usize; 4], HullError> {
    let a = 0;
    let b = farthest(points, |p| p.distance(points[a]));
    if points[b].distance(points[a]) <= eps {
        return Err(HullError::Degenerate("coincident"));
    }

    let ab = (points[b] - points[a]).normalize();
    let c = farthest(points, |p| (p - points[a]).cross(ab).length());
    if (points[c] - points[a]).cross(ab).length() <= eps {
        return Err(HullError::Degenerate("collinear"));
    }

    let n = (points[b] - points[a])
        .cross(points[c] - points[a])
        .normalize();
    let d = farthest(points, |p| n.dot(p - points[a]).abs());
    if n.dot(points[d] - points[a]).abs() <= eps {
        return Err(HullError::Degenerate("coplanar"));
    }

    Ok([a, b, c, d])
}

fn farthest(points: &[Vec3], metric: impl Fn(Vec3) -> f32) -> usize {
    let mut best = 0;
    let mut best_val = f32::NEG_INFINITY;
    for (i, &p) in points.iter().enumerate() {
        let m = metric(p);
        if m > best_val {
            best_val = m;
            best = i;
        }
    }
    best
}

/// An RGB colour packed as `0xRRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    /// Red, green and blue channels.
    pub fn rgb(self) -> [u8; 3] {
        [(self.0 >> 16) as u8, (self.0 >> 8) as u8, self.0 as u8]
    }

    /// `#rrggbb`.
    pub fn hex(self) -> String {
        format!("#{:06x}", self.0 & 0x00ff_ffff)
    }
}

/// Cluster colours, indexed by cluster id modulo length.
pub const CLUSTER_PALETTE: [Color; 8] = [
    Color(0xe74c3c), // red
    Color(0x3498db), // blue
    Color(0x2ecc71), // green
    Color(0xf39c12), // orange
    Color(0x9b59b6), // purple
    Color(0x1abc9c), // teal
    Color(0xe67e22), // dark orange
    Color(0xe91e8c), // pink
];

/// Palette colour for a cluster id.
pub fn cluster_color(cluster: usize) -> Color {
    CLUSTER_PALETTE[cluster % CLUSTER_PALETTE.len()]
}

/// Default outward padding in world units.
pub const DEFAULT_PADDING: f32 = 3.0;

/// Smallest cluster that gets a hull.
pub const MIN_HULL_MEMBERS: usize = 4;

/// Builds padded hulls around cluster members.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterHullBuilder {
    padding: f32,
    min_members: usize,
}

impl Default for ClusterHullBuilder {
    fn default() -> Self {
        Self {
            padding: DEFAULT_PADDING,
            min_members: MIN_HULL_MEMBERS,
        }
    }
}

impl ClusterHullBuilder {
    /// Builder with the given padding and the default member threshold.
    pub fn new(padding: f32) -> Self {
        Self {
            padding,
            ..Self::default()
        }
    }

    /// Raise the member threshold. Values below 4 are ignored.
    pub fn with_min_members(mut self, min_members: usize) -> Self {
        self.min_members = min_members.max(MIN_HULL_MEMBERS);
        self
    }

    /// Outward padding in world units.
    pub fn padding(&self) -> f32 {
        self.padding
    }

    /// Each point moved `padding` further from the centroid. A point sitting on
    /// the centroid stays put.
    pub fn pad(&self, members: &[Vec3]) -> Vec<Vec3> {
        if members.is_empty() {
            return Vec::new();
        }
        let centroid = members.iter().copied().sum::<Vec3>() / members.len() as f32;
        members
            .iter()
            .map(|&p| p + (p - centroid).normalize_or_zero() * self.padding)
            .collect()
    }

    /// Hull for one cluster, or `None` when it is too small or degenerate.
    pub fn build(&self, cluster: usize, members: &[Vec3]) -> Option<ConvexHull> {
        if members.len() < self.min_members {
            debug!(cluster, members = members.len(), "cluster too small for a hull");
            return None;
        }
        match ConvexHull::new(&self.pad(members)) {
            Ok(hull) => Some(hull),
            Err(e) => {
                warn!(cluster, error = %e, "cluster hull failed, skipping");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tetra() -> Vec<Vec3> {
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        ]
    }

    fn cube_with_interior() -> Vec<Vec3> {
        let mut pts = Vec::new();
        for x in [-1.0, 1.0] {
            for y in [-1.0, 1.0] {
                for z in [-1.0, 1.0] {
                    pts.push(Vec3::new(x, y, z));
                }
            }
        }
        pts.push(Vec3::ZERO);
        pts.push(Vec3::new(0.3, -0.2, 0.5));
        pts
    }

    /// Every undirected edge is shared by exactly two faces, in opposite directions.
    fn assert_closed(hull: &ConvexHull) {
        let mut directed = HashSet::new();
        for &[a, b, c] in &hull.faces {
            for e in [(a, b), (b, c), (c, a)] {
                assert!(directed.insert(e), "edge {e:?} used twice in one direction");
            }
        }
        for &(u, v) in &directed {
            assert!(directed.contains(&(v, u)), "edge ({u}, {v}) has no twin");
        }
    }

    #[test]
    fn tetrahedron_has_four_outward_faces() {
        let pts = tetra();
        let hull = ConvexHull::new(&pts).unwrap();
        assert_eq!(hull.faces.len(), 4);
        assert_eq!(hull.vertices.len(), 4);
        assert_closed(&hull);

        let inside = Vec3::splat(0.1);
        for i in 0..hull.faces.len() {
            let a = hull.vertices[hull.faces[i][0]];
            assert!(hull.normal(i).dot(inside - a) < 0.0);
        }
    }

    #[test]
    fn cube_encloses_all_points() {
        let pts = cube_with_interior();
        let hull = ConvexHull::new(&pts).unwrap();
        assert_closed(&hull);
        assert_eq!(hull.vertices.len(), 8);
        for &p in &pts {
            assert!(hull.contains(p, 1e-4));
        }
        assert!(!hull.contains(Vec3::new(1.5, 0.0, 0.0), 1e-4));
        // Euler: V - E + F = 2.
        let v = hull.vertices.len() as i64;
        let e = hull.edges().len() as i64;
        let f = hull.faces.len() as i64;
        assert_eq!(v - e + f, 2);
    }

    #[test]
    fn rebuilding_gives_identical_hull() {
        use rand::prelude::*;

        let mut rng = StdRng::seed_from_u64(7);
        let pts: Vec<Vec3> = (0..30)
            .map(|_| {
                Vec3::new(
                    rng.random_range(-10.0..10.0),
                    rng.random_range(-10.0..10.0),
                    rng.random_range(-10.0..10.0),
                )
            })
            .collect();
        let first = ConvexHull::new(&pts).unwrap();
        assert_closed(&first);
        for _ in 0..20 {
            assert_eq!(ConvexHull::new(&pts).unwrap(), first);
        }
    }

    #[test]
    fn degenerate_inputs_fail() {
        assert_eq!(
            ConvexHull::new(&tetra()[..3]),
            Err(HullError::TooFewPoints { found: 3 })
        );
        assert_eq!(
            ConvexHull::new(&[Vec3::ONE; 5]),
            Err(HullError::Degenerate("coincident"))
        );
        let line: Vec<Vec3> = (0..5).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect();
        assert_eq!(ConvexHull::new(&line), Err(HullError::Degenerate("collinear")));
        let plane = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
        ];
        assert_eq!(ConvexHull::new(&plane), Err(HullError::Degenerate("coplanar")));
    }

    #[test]
    fn padding_moves_points_away_from_centroid() {
        let builder = ClusterHullBuilder::new(3.0);
        let pts = vec![Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO];
        let padded = builder.pad(&pts);
        assert_eq!(padded[0], Vec3::new(-4.0, 0.0, 0.0));
        assert_eq!(padded[1], Vec3::new(4.0, 0.0, 0.0));
        assert_eq!(padded[2], Vec3::ZERO);
    }

    #[test]
    fn small_clusters_get_no_hull() {
        let builder = ClusterHullBuilder::default();
        assert!(builder.build(0, &tetra()[..3]).is_none());
        let hull = builder.build(0, &tetra()).unwrap();
        assert!(!hull.faces.is_empty());
    }

    #[test]
    fn padded_hull_contains_members() {
        let builder = ClusterHullBuilder::default();
        let pts = cube_with_interior();
        let hull = builder.build(2, &pts).unwrap();
        for &p in &pts {
            assert!(hull.contains(p, 1e-3));
        }
    }

    #[test]
    fn coplanar_cluster_is_skipped() {
        let plane: Vec<Vec3> = (0..6)
            .map(|i| Vec3::new(i as f32, (i * i) as f32, 2.0))
            .collect();
        assert!(ClusterHullBuilder::default().build(1, &plane).is_none());
    }

    #[test]
    fn palette_wraps() {
        assert_eq!(cluster_color(0), cluster_color(8));
        assert_eq!(cluster_color(1).hex(), "#3498db");
        assert_eq!(cluster_color(2).rgb(), [0x2e, 0xcc, 0x71]);
    }
}
