//! Centroid-partition layering.
//!
//! The finest layer is k-means over the points with `base_n_clusters`
//! clusters. Each coarser layer runs k-means over the previous layer's
//! centroids and hands the result back to the points, so a coarse cluster is
//! always a union of whole finer clusters:
//!
//! ```text
//! points ──k-means(64)──► layer 0 ──centroids──k-means(16)──► layer 1
//!                                  ──centroids──k-means(4)───► layer 2
//! ```
//!
//! Cluster counts shrink geometrically from `base_n_clusters` to
//! `min_clusters` over `n_layers` layers. No point is ever noise.

use super::LayeredClustering;
use crate::cluster::Kmeans;
use crate::error::{Error, Result};
use crate::hierarchy::{centroids_from_labels, validate_max_layers};
use crate::labels::{n_clusters, relabel_contiguous, Label};
use ndarray::ArrayView2;

/// K-means layering over points and then over centroids.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PartitionStrategy {
    /// Cluster count of the coarsest layer.
    pub min_clusters: usize,
    /// Cluster count of the finest layer (clamped to the point count).
    pub base_n_clusters: usize,
    /// Number of layers to build.
    pub n_layers: usize,
    /// Cap on the number of emitted layers.
    pub max_layers: Option<usize>,
    /// Seed for k-means; each layer derives its own.
    pub seed: Option<u64>,
    /// Lloyd iterations per k-means run.
    pub max_iter: usize,
}

impl Default for PartitionStrategy {
    fn default() -> Self {
        Self {
            min_clusters: 6,
            base_n_clusters: 1024,
            n_layers: 3,
            max_layers: None,
            seed: None,
            max_iter: 100,
        }
    }
}

impl PartitionStrategy {
    /// Partition layering with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cluster count of the coarsest layer.
    pub fn with_min_clusters(mut self, min_clusters: usize) -> Self {
        self.min_clusters = min_clusters;
        self
    }

    /// Set the cluster count of the finest layer.
    pub fn with_base_n_clusters(mut self, base_n_clusters: usize) -> Self {
        self.base_n_clusters = base_n_clusters;
        self
    }

    /// Set the number of layers to build.
    pub fn with_n_layers(mut self, n_layers: usize) -> Self {
        self.n_layers = n_layers;
        self
    }

    /// Cap the number of emitted layers.
    pub fn with_max_layers(mut self, max_layers: usize) -> Self {
        self.max_layers = Some(max_layers);
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set Lloyd iterations per k-means run.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if self.min_clusters == 0 {
            return Err(Error::InvalidParameter {
                name: "min_clusters",
                message: "must be at least 1",
            });
        }
        if self.base_n_clusters < self.min_clusters {
            return Err(Error::InvalidParameter {
                name: "base_n_clusters",
                message: "must be at least min_clusters",
            });
        }
        if self.n_layers == 0 {
            return Err(Error::InvalidParameter {
                name: "n_layers",
                message: "must be at least 1",
            });
        }
        if self.max_iter == 0 {
            return Err(Error::InvalidParameter {
                name: "max_iter",
                message: "must be at least 1",
            });
        }
        validate_max_layers(self.max_layers)
    }

    /// Strictly decreasing cluster counts, finest first.
    pub fn cluster_counts(&self, n_points: usize) -> Vec<usize> {
        let base = self.base_n_clusters.min(n_points).max(1);
        let min = self.min_clusters.min(base).max(1);
        let ratio = min as f64 / base as f64;
        let steps = self.n_layers.saturating_sub(1).max(1) as f64;

        let mut counts: Vec<usize> = Vec::with_capacity(self.n_layers);
        for i in 0..self.n_layers {
            let k = (base as f64 * ratio.powf(i as f64 / steps)).round() as usize;
            let k = k.clamp(min, base);
            if counts.last().map_or(true, |&prev| k < prev) {
                counts.push(k);
            }
        }
        counts
    }

    fn kmeans(&self, k: usize, layer: usize) -> Kmeans {
        let km = Kmeans::new(k).with_max_iter(self.max_iter);
        match self.seed {
            Some(seed) => km.with_seed(seed.wrapping_add(layer as u64)),
            None => km,
        }
    }
}

impl LayeredClustering for PartitionStrategy {
    fn label_layers(&self, clusterable: ArrayView2<'_, f32>) -> Result<Vec<Vec<Label>>> {
        self.validate()?;
        let n = clusterable.nrows();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        let counts = self.cluster_counts(n);
        let Some((&base_k, coarser)) = counts.split_first() else {
            return Ok(Vec::new());
        };

        let fit = self.kmeans(base_k, 0).fit(clusterable)?;
        let mut labels: Vec<Label> = fit.labels.iter().map(|&l| l as Label).collect();
        let _ = relabel_contiguous(&mut labels);
        log::debug!("partition layer 0: {} clusters", n_clusters(&labels));
        let mut layers = vec![labels];

        for (layer, &k) in coarser.iter().enumerate().map(|(i, k)| (i + 1, k)) {
            let Some(previous) = layers.last() else {
                break;
            };
            let current = n_clusters(previous);
            if k >= current {
                continue;
            }
            let centroids = centroids_from_labels(previous, clusterable)?;
            let merged = self.kmeans(k, layer).fit(centroids.view())?.labels;

            let mut labels: Vec<Label> = previous
                .iter()
                .map(|&l| merged[l as usize] as Label)
                .collect();
            let _ = relabel_contiguous(&mut labels);
            log::debug!("partition layer {}: {} clusters", layer, n_clusters(&labels));
            layers.push(labels);
        }

        Ok(layers)
    }

    fn min_clusters(&self) -> usize {
        self.min_clusters
    }

    fn max_layers(&self) -> Option<usize> {
        self.max_layers
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::labels::members;
    use ndarray::Array2;

    fn blobs(groups: usize, per_group: usize) -> Array2<f32> {
        Array2::from_shape_fn((groups * per_group, 2), |(i, j)| {
            let g = (i / per_group) as f32;
            let jitter = ((i * 7 + j * 3) % per_group) as f32 * 0.01;
            if j == 0 {
                g * 20.0 + jitter
            } else {
                (g % 2.0) * 20.0 + jitter
            }
        })
    }

    #[test]
    fn test_cluster_counts_geometric() {
        let s = PartitionStrategy::new().with_base_n_clusters(64).with_min_clusters(4);
        assert_eq!(s.cluster_counts(1000), vec![64, 16, 4]);
        // Clamped to the point count.
        assert_eq!(s.cluster_counts(10), vec![10, 6, 4]);
        // Nothing to coarsen.
        assert_eq!(s.cluster_counts(3), vec![3]);
        let one = s.clone().with_n_layers(1);
        assert_eq!(one.cluster_counts(1000), vec![64]);
    }

    #[test]
    fn test_layers_nest_exactly() {
        let data = blobs(4, 25);
        let s = PartitionStrategy::new()
            .with_base_n_clusters(20)
            .with_min_clusters(4)
            .with_seed(3);
        let layers = s.label_layers(data.view()).unwrap();
        assert_eq!(layers.len(), 3);

        for pair in layers.windows(2) {
            let (fine, coarse) = (&pair[0], &pair[1]);
            assert!(n_clusters(coarse) < n_clusters(fine));
            for k in 0..n_clusters(fine) {
                let pts = members(fine, k);
                assert!(pts.iter().all(|&p| coarse[p] == coarse[pts[0]]));
            }
        }
        assert!(layers.iter().flatten().all(|&l| l >= 0));
        assert_eq!(n_clusters(&layers[2]), 4);
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let data = blobs(3, 20);
        let s = PartitionStrategy::new()
            .with_base_n_clusters(12)
            .with_min_clusters(3)
            .with_seed(42);
        assert_eq!(
            s.label_layers(data.view()).unwrap(),
            s.label_layers(data.view()).unwrap()
        );
    }

    #[test]
    fn test_validate() {
        assert!(PartitionStrategy::new().validate().is_ok());
        assert!(PartitionStrategy::new().with_n_layers(0).validate().is_err());
        assert!(PartitionStrategy::new().with_min_clusters(0).validate().is_err());
        assert!(PartitionStrategy::new()
            .with_base_n_clusters(2)
            .with_min_clusters(3)
            .validate()
            .is_err());
        assert!(PartitionStrategy::new().with_max_layers(0).validate().is_err());
    }
}
