//! Clustering traits.
//!
//! These are the collaborator seams of the layering core: the core only
//! depends on the shape of what they return (one label per point, `-1` for
//! noise, ids contiguous from `0`).

use crate::error::Result;
use crate::labels::Label;
use ndarray::ArrayView2;

/// Trait for partition clustering algorithms (every point gets a cluster).
pub trait Clustering {
    /// Fit the model to data and return cluster assignments.
    ///
    /// Returns a vector of cluster labels, one per input row.
    fn fit_predict(&self, data: ArrayView2<'_, f32>) -> Result<Vec<usize>>;
}

/// A fitted density hierarchy that can be cut at any minimum cluster size.
pub trait DensityHierarchy {
    /// Flat labels for the given minimum cluster size (`-1` = noise).
    fn labels_at(&self, min_cluster_size: usize) -> Vec<Label>;
}

/// Density-based clustering with noise.
///
/// Fitting is separated from cutting so that layer building can run the
/// expensive part once and re-cut the result at growing thresholds.
pub trait DensityClustering {
    /// The fitted hierarchy.
    type Hierarchy: DensityHierarchy;

    /// Fit the density hierarchy over all rows of `data`.
    fn fit(&self, data: ArrayView2<'_, f32>, min_samples: usize) -> Result<Self::Hierarchy>;

    /// One-shot clustering: fit, then cut at `min_cluster_size`.
    fn cluster(
        &self,
        data: ArrayView2<'_, f32>,
        min_cluster_size: usize,
        min_samples: usize,
    ) -> Result<Vec<Label>> {
        Ok(self.fit(data, min_samples)?.labels_at(min_cluster_size))
    }
}

/// Consensus clustering that produces several resolutions at once.
pub trait EnsembleClustering {
    /// Label vectors at each resolution the procedure produces, in any order.
    fn cluster_layers(&self, data: ArrayView2<'_, f32>) -> Result<Vec<Vec<Label>>>;
}
