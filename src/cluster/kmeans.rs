//! K-means clustering.
//!
//! Partitions rows into k clusters by minimising the within-cluster sum of
//! squares (Lloyd's algorithm, k-means++ seeding).
//!
//! K-means is the partition collaborator of the layering core: the
//! centroid-partition strategy runs it once over the points and then again over
//! the centroids of the previous layer, so each coarser layer is a grouping of
//! whole finer clusters.
//!
//! # Failure Modes
//!
//! - **Local optima**: Lloyd finds a local minimum only; seeding matters.
//! - **Empty clusters**: a centroid that loses all its points is re-seeded on a
//!   random row.
//!
//! Results are reproducible only with [`Kmeans::with_seed`].

use super::traits::Clustering;
use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView1, ArrayView2};
use rand::prelude::*;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Total squared centroid shift below which Lloyd iterations stop.
const CONVERGENCE_TOL: f64 = 1e-4;

/// K-means clustering algorithm.
#[derive(Debug, Clone)]
pub struct Kmeans {
    k: usize,
    max_iter: usize,
    seed: Option<u64>,
}

/// Labels and final centroids of a k-means run.
#[derive(Debug, Clone)]
pub struct KmeansFit {
    /// Cluster index per row, in `0..k`.
    pub labels: Vec<usize>,
    /// `k × d` centroid matrix.
    pub centroids: Array2<f32>,
}

impl Kmeans {
    /// Create a new K-means clusterer.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iter: 100,
            seed: None,
        }
    }

    /// Set maximum iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn squared_distance(a: ArrayView1<'_, f32>, b: ArrayView1<'_, f32>) -> f32 {
        a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
    }

    fn nearest(point: ArrayView1<'_, f32>, centroids: &Array2<f32>) -> usize {
        let mut best = 0;
        let mut best_dist = f32::INFINITY;
        for (c, centroid) in centroids.rows().into_iter().enumerate() {
            let dist = Self::squared_distance(point, centroid);
            if dist < best_dist {
                best_dist = dist;
                best = c;
            }
        }
        best
    }

    /// k-means++: first centre uniform, then proportional to D(x)².
    fn seed_centroids(&self, data: ArrayView2<'_, f32>, rng: &mut impl Rng) -> Array2<f32> {
        let n = data.nrows();
        let mut centroids = Array2::zeros((self.k, data.ncols()));
        centroids.row_mut(0).assign(&data.row(rng.random_range(0..n)));

        let mut closest: Vec<f32> = data
            .rows()
            .into_iter()
            .map(|row| Self::squared_distance(row, centroids.row(0)))
            .collect();

        for c in 1..self.k {
            let total: f32 = closest.iter().sum();
            let chosen = if total > 0.0 {
                let threshold = rng.random::<f32>() * total;
                let mut cumsum = 0.0;
                closest
                    .iter()
                    .position(|&d| {
                        cumsum += d;
                        cumsum >= threshold
                    })
                    .unwrap_or(n - 1)
            } else {
                rng.random_range(0..n)
            };
            centroids.row_mut(c).assign(&data.row(chosen));

            for (dist, row) in closest.iter_mut().zip(data.rows()) {
                *dist = dist.min(Self::squared_distance(row, centroids.row(c)));
            }
        }

        centroids
    }

    fn assign(data: ArrayView2<'_, f32>, centroids: &Array2<f32>, labels: &mut [usize]) {
        #[cfg(feature = "parallel")]
        labels.par_iter_mut().enumerate().for_each(|(i, label)| {
            *label = Self::nearest(data.row(i), centroids);
        });

        #[cfg(not(feature = "parallel"))]
        for (i, label) in labels.iter_mut().enumerate() {
            *label = Self::nearest(data.row(i), centroids);
        }
    }

    /// Run Lloyd's algorithm and return labels together with the centroids.
    pub fn fit(&self, data: ArrayView2<'_, f32>) -> Result<KmeansFit> {
        let (n, d) = data.dim();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if self.k == 0 || self.k > n {
            return Err(Error::InvalidClusterCount {
                requested: self.k,
                n_items: n,
            });
        }

        let mut rng: Box<dyn RngCore> = match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };

        let mut centroids = self.seed_centroids(data, &mut rng);
        let mut labels = vec![0usize; n];
        let mut iterations = 0;

        while iterations < self.max_iter {
            iterations += 1;
            Self::assign(data, &centroids, &mut labels);

            let mut sums = Array2::<f64>::zeros((self.k, d));
            let mut counts = vec![0usize; self.k];
            for (&label, row) in labels.iter().zip(data.rows()) {
                counts[label] += 1;
                for (s, &x) in sums.row_mut(label).iter_mut().zip(row.iter()) {
                    *s += f64::from(x);
                }
            }

            let mut updated = Array2::<f32>::zeros((self.k, d));
            for c in 0..self.k {
                if counts[c] == 0 {
                    updated.row_mut(c).assign(&data.row(rng.random_range(0..n)));
                    continue;
                }
                let denom = counts[c] as f64;
                for (u, &s) in updated.row_mut(c).iter_mut().zip(sums.row(c).iter()) {
                    *u = (s / denom) as f32;
                }
            }

            let shift: f64 = centroids
                .iter()
                .zip(updated.iter())
                .map(|(a, b)| f64::from(a - b).powi(2))
                .sum();
            centroids = updated;

            if shift < CONVERGENCE_TOL {
                break;
            }
        }

        // Final assignment against the converged centroids.
        Self::assign(data, &centroids, &mut labels);

        log::trace!("k-means k={}: {} iterations", self.k, iterations);

        Ok(KmeansFit { labels, centroids })
    }
}

impl Clustering for Kmeans {
    fn fit_predict(&self, data: ArrayView2<'_, f32>) -> Result<Vec<usize>> {
        Ok(self.fit(data)?.labels)
    }
}
