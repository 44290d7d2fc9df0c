//! K-means with k-means++ seeding and Lloyd iterations.
//!
//! # Seeding (Arthur & Vassilvitskii, 2007)
//!
//! 1. Pick the first centroid uniformly at random.
//! 2. For every point not yet chosen, compute `D(x)²`: the squared distance to
//!    the nearest centroid chosen so far. Pick the next centroid with probability
//!    proportional to `D(x)²`. Points already chosen carry zero weight.
//! 3. Repeat until `k` centroids exist.
//!
//! If every remaining point sits exactly on an existing centroid (total weight is
//! zero), the lowest-index point that has not been chosen is taken.
//!
//! # Iteration
//!
//! Each round assigns every point to its nearest centroid (ties go to the lowest
//! cluster index), then moves each centroid to the mean of its members. A
//! centroid with no members keeps its previous position. The loop stops as soon
//! as a round leaves every assignment unchanged, or after `max_iter` rounds.
//!
//! Randomness only enters through seeding. Use [`Kmeans::with_seed`] or
//! [`Kmeans::fit_with_rng`] for reproducible labels.

use super::traits::Clustering;
use super::util::squared_euclidean;
use crate::error::{Error, Result};
use rand::prelude::*;
use tracing::debug;

/// Default iteration cap.
pub const DEFAULT_MAX_ITER: usize = 60;

/// K-means clusterer.
#[derive(Debug, Clone)]
pub struct Kmeans {
    k: usize,
    max_iter: usize,
    seed: Option<u64>,
}

/// Result of a k-means fit.
#[derive(Debug, Clone, PartialEq)]
pub struct KmeansFit {
    /// Cluster id in `[0, k)` for each input point, in input order.
    pub labels: Vec<usize>,
    /// Final centroid positions, indexed by cluster id.
    pub centroids: Vec<Vec<f32>>,
    /// Number of assignment rounds that ran.
    pub iterations: usize,
    /// Whether the run stopped because assignments stabilised.
    pub converged: bool,
}

impl KmeansFit {
    /// Number of points assigned to each cluster.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.centroids.len()];
        for &l in &self.labels {
            sizes[l] += 1;
        }
        sizes
    }

    /// Within-cluster sum of squared distances for the given data.
    pub fn inertia<V: AsRef<[f32]>>(&self, data: &[V]) -> f32 {
        data.iter()
            .zip(&self.labels)
            .map(|(v, &l)| squared_euclidean(v.as_ref(), &self.centroids[l]))
            .sum()
    }
}

impl Kmeans {
    /// Create a clusterer for `k` clusters.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iter: DEFAULT_MAX_ITER,
            seed: None,
        }
    }

    /// Set the maximum number of assignment rounds.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Seed the internal generator for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Maximum number of assignment rounds.
    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    /// Fit using the configured seed, or an OS-seeded generator when unset.
    pub fn fit<V: AsRef<[f32]>>(&self, data: &[V]) -> Result<KmeansFit> {
        match self.seed {
            Some(s) => self.fit_with_rng(data, &mut StdRng::seed_from_u64(s)),
            None => self.fit_with_rng(data, &mut rand::rng()),
        }
    }

    /// Fit drawing all randomness from `rng`.
    pub fn fit_with_rng<V, R>(&self, data: &[V], rng: &mut R) -> Result<KmeansFit>
    where
        V: AsRef<[f32]>,
        R: Rng + ?Sized,
    {
        let dim = self.validate(data)?;
        let mut centroids = seed_plus_plus(data, self.k, rng);

        let n = data.len();
        let mut labels = vec![0usize; n];
        let mut previous: Option<Vec<usize>> = None;
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iter {
            iterations += 1;

            for (label, v) in labels.iter_mut().zip(data) {
                *label = nearest(v.as_ref(), &centroids);
            }

            update_centroids(data, &labels, &mut centroids, dim);

            if previous.as_deref() == Some(labels.as_slice()) {
                converged = true;
                break;
            }
            previous = Some(labels.clone());
        }

        debug!(n, k = self.k, iterations, converged, "k-means finished");

        Ok(KmeansFit {
            labels,
            centroids,
            iterations,
            converged,
        })
    }

    fn validate<V: AsRef<[f32]>>(&self, data: &[V]) -> Result<usize> {
        if data.is_empty() {
            return Err(Error::EmptyInput);
        }
        if self.k == 0 {
            return Err(Error::InvalidParameter {
                name: "k",
                message: "must be at least 1",
            });
        }
        if self.max_iter == 0 {
            return Err(Error::InvalidParameter {
                name: "max_iter",
                message: "must be at least 1",
            });
        }
        if self.k > data.len() {
            return Err(Error::InvalidClusterCount {
                requested: self.k,
                n_items: data.len(),
            });
        }

        let dim = data[0].as_ref().len();
        if dim == 0 {
            return Err(Error::InvalidParameter {
                name: "data",
                message: "points must have at least one dimension",
            });
        }
        for v in data {
            let found = v.as_ref().len();
            if found != dim {
                return Err(Error::DimensionMismatch {
                    expected: dim,
                    found,
                });
            }
        }
        Ok(dim)
    }
}

impl Clustering for Kmeans {
    fn fit_predict(&self, data: &[Vec<f32>]) -> Result<Vec<usize>> {
        Ok(self.fit(data)?.labels)
    }

    fn n_clusters(&self) -> usize {
        self.k
    }
}

/// k-means++ seeding. Caller guarantees `1 <= k <= data.len()`.
fn seed_plus_plus<V, R>(data: &[V], k: usize, rng: &mut R) -> Vec<Vec<f32>>
where
    V: AsRef<[f32]>,
    R: Rng + ?Sized,
{
    let n = data.len();
    let mut chosen = vec![false; n];
    let mut centroids: Vec<Vec<f32>> = Vec::with_capacity(k);

    let first = rng.random_range(0..n);
    chosen[first] = true;
    centroids.push(data[first].as_ref().to_vec());

    // Squared distance from each point to its nearest chosen centroid.
    let mut d2: Vec<f32> = data
        .iter()
        .map(|v| squared_euclidean(v.as_ref(), &centroids[0]))
        .collect();

    while centroids.len() < k {
        let total: f64 = d2
            .iter()
            .zip(&chosen)
            .filter(|(_, c)| !**c)
            .map(|(d, _)| f64::from(*d))
            .sum();

        let weighted = if total > 0.0 {
            sample_weighted(&d2, &chosen, total, rng)
        } else {
            None
        };
        let next = weighted.or_else(|| chosen.iter().position(|&c| !c));

        // k <= n, so an unchosen point always remains.
        let Some(idx) = next else { break };

        chosen[idx] = true;
        let c = data[idx].as_ref().to_vec();
        for (d, v) in d2.iter_mut().zip(data) {
            let nd = squared_euclidean(v.as_ref(), &c);
            if nd < *d {
                *d = nd;
            }
        }
        centroids.push(c);
    }

    centroids
}

fn sample_weighted<R: Rng + ?Sized>(
    d2: &[f32],
    chosen: &[bool],
    total: f64,
    rng: &mut R,
) -> Option<usize> {
    let mut target = rng.random::<f64>() * total;
    let mut last_positive = None;
    for (i, (&d, &c)) in d2.iter().zip(chosen).enumerate() {
        if c || d <= 0.0 {
            continue;
        }
        last_positive = Some(i);
        target -= f64::from(d);
        if target <= 0.0 {
            return Some(i);
        }
    }
    // Rounding can leave a sliver of weight unspent.
    last_positive
}

fn nearest(v: &[f32], centroids: &[Vec<f32>]) -> usize {
    let mut best = 0;
    let mut best_dist = f32::INFINITY;
    for (c, centroid) in centroids.iter().enumerate() {
        let d = squared_euclidean(v, centroid);
        if d < best_dist {
            best_dist = d;
            best = c;
        }
    }
    best
}

fn update_centroids<V: AsRef<[f32]>>(
    data: &[V],
    labels: &[usize],
    centroids: &mut [Vec<f32>],
    dim: usize,
) {
    let k = centroids.len();
    let mut sums = vec![vec![0.0f64; dim]; k];
    let mut counts = vec![0usize; k];

    for (v, &l) in data.iter().zip(labels) {
        counts[l] += 1;
        for (s, &x) in sums[l].iter_mut().zip(v.as_ref()) {
            *s += f64::from(x);
        }
    }

    for ((centroid, sum), &count) in centroids.iter_mut().zip(&sums).zip(&counts) {
        if count == 0 {
            continue;
        }
        for (c, &s) in centroid.iter_mut().zip(sum) {
            *c = (s / count as f64) as f32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_blobs() -> Vec<Vec<f32>> {
        vec![
            vec![0.0, 0.0],
            vec![0.1, 0.0],
            vec![0.0, 0.1],
            vec![5.0, 5.0],
            vec![5.1, 5.0],
            vec![5.0, 5.1],
        ]
    }

    #[test]
    fn test_kmeans_two_clusters() {
        let data = two_blobs();
        let fit = Kmeans::new(2).with_seed(42).fit(&data).unwrap();

        assert_eq!(fit.labels.len(), 6);
        assert_eq!(fit.labels[0], fit.labels[1]);
        assert_eq!(fit.labels[0], fit.labels[2]);
        assert_eq!(fit.labels[3], fit.labels[4]);
        assert_eq!(fit.labels[3], fit.labels[5]);
        assert_ne!(fit.labels[0], fit.labels[3]);
        assert!(fit.converged);
        assert_eq!(fit.cluster_sizes(), vec![3, 3]);
    }

    #[test]
    fn test_kmeans_centroids_are_member_means() {
        let data = two_blobs();
        let fit = Kmeans::new(2).with_seed(3).fit(&data).unwrap();
        let low = fit.labels[0];
        let c = &fit.centroids[low];
        assert!((c[0] - 0.1 / 3.0).abs() < 1e-5);
        assert!((c[1] - 0.1 / 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_kmeans_inertia() {
        let data = two_blobs();
        let fit = Kmeans::new(2).with_seed(42).fit(&data).unwrap();
        // Each blob contributes 2/900 + 5/900 + 5/900 around its mean.
        assert!((fit.inertia(&data) - 24.0 / 900.0).abs() < 1e-4);

        let single = Kmeans::new(1).with_seed(42).fit(&data).unwrap();
        assert!(single.inertia(&data) > fit.inertia(&data));
    }

    #[test]
    fn test_kmeans_same_seed_same_labels() {
        let data: Vec<Vec<f32>> = (0..40)
            .map(|i| vec![(i % 7) as f32 * 0.3, (i % 5) as f32 * 0.7, (i % 3) as f32])
            .collect();
        let a = Kmeans::new(4).with_seed(9).fit(&data).unwrap();
        let b = Kmeans::new(4).with_seed(9).fit(&data).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_kmeans_injected_rng_matches_seed() {
        let data = two_blobs();
        let seeded = Kmeans::new(2).with_seed(11).fit(&data).unwrap();
        let injected = Kmeans::new(2)
            .fit_with_rng(&data, &mut StdRng::seed_from_u64(11))
            .unwrap();
        assert_eq!(seeded.labels, injected.labels);
    }

    #[test]
    fn test_kmeans_identical_points_collapse() {
        let data = vec![vec![0.4, 0.4]; 5];
        let fit = Kmeans::new(3).with_seed(1).fit(&data).unwrap();
        assert!(fit.labels.iter().all(|&l| l == 0));
        assert_eq!(fit.centroids.len(), 3);
        assert_eq!(fit.cluster_sizes(), vec![5, 0, 0]);
    }

    #[test]
    fn test_kmeans_empty_cluster_keeps_centroid() {
        let mut centroids = vec![vec![0.0, 0.0], vec![9.0, 9.0]];
        let data = vec![vec![1.0, 1.0], vec![3.0, 3.0]];
        update_centroids(&data, &[0, 0], &mut centroids, 2);
        assert_eq!(centroids[0], vec![2.0, 2.0]);
        assert_eq!(centroids[1], vec![9.0, 9.0]);
    }

    #[test]
    fn test_nearest_breaks_ties_low() {
        let centroids = vec![vec![1.0], vec![-1.0]];
        assert_eq!(nearest(&[0.0], &centroids), 0);
    }

    #[test]
    fn test_seeding_picks_distinct_points() {
        let data = vec![vec![0.0], vec![0.0], vec![1.0], vec![2.0]];
        let mut rng = StdRng::seed_from_u64(5);
        let c = seed_plus_plus(&data, 4, &mut rng);
        assert_eq!(c.len(), 4);
        let mut vals: Vec<f32> = c.iter().map(|v| v[0]).collect();
        vals.sort_by(f32::total_cmp);
        assert_eq!(vals, vec![0.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_kmeans_k_exceeds_n() {
        let data = vec![vec![0.0], vec![1.0]];
        let err = Kmeans::new(3).fit(&data).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidClusterCount {
                requested: 3,
                n_items: 2
            }
        ));
    }

    #[test]
    fn test_kmeans_invalid_inputs() {
        let empty: Vec<Vec<f32>> = vec![];
        assert!(matches!(Kmeans::new(1).fit(&empty), Err(Error::EmptyInput)));

        let data = vec![vec![0.0, 1.0], vec![1.0]];
        assert!(matches!(
            Kmeans::new(1).fit(&data),
            Err(Error::DimensionMismatch {
                expected: 2,
                found: 1
            })
        ));

        let data = vec![vec![0.0]];
        assert!(Kmeans::new(0).fit(&data).is_err());
        assert!(Kmeans::new(1).with_max_iter(0).fit(&data).is_err());
    }

    #[test]
    fn test_kmeans_respects_max_iter() {
        let data = two_blobs();
        let fit = Kmeans::new(2).with_max_iter(1).with_seed(0).fit(&data).unwrap();
        assert_eq!(fit.iterations, 1);
        assert!(!fit.converged);
    }
}
