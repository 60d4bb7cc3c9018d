//! Density layering: one hierarchy, cut at growing minimum cluster sizes.

use super::LayeredClustering;
use crate::cluster::{DensityClustering, Hdbscan};
use crate::error::Result;
use crate::hierarchy::{build_raw_cluster_layers, LayerParams};
use crate::labels::Label;
use ndarray::ArrayView2;

/// Layers from a density hierarchy (see [`build_raw_cluster_layers`]).
///
/// Any [`DensityClustering`] collaborator can stand in for the default
/// [`Hdbscan`].
#[derive(Debug, Clone, Default)]
pub struct DensityStrategy<C = Hdbscan> {
    params: LayerParams,
    clusterer: C,
}

impl DensityStrategy<Hdbscan> {
    /// Density layering with default parameters and [`Hdbscan`].
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: DensityClustering> DensityStrategy<C> {
    /// Density layering with a custom collaborator.
    pub fn with_clusterer(clusterer: C, params: LayerParams) -> Self {
        Self { params, clusterer }
    }

    /// Replace all layering parameters.
    pub fn with_params(mut self, params: LayerParams) -> Self {
        self.params = params;
        self
    }

    /// Set the minimum number of clusters per layer.
    pub fn with_min_clusters(mut self, min_clusters: usize) -> Self {
        self.params.min_clusters = min_clusters;
        self
    }

    /// Set `min_samples`.
    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.params.min_samples = min_samples;
        self
    }

    /// Set the finest layer's minimum cluster size.
    pub fn with_base_min_cluster_size(mut self, size: usize) -> Self {
        self.params.base_min_cluster_size = size;
        self
    }

    /// Set the cluster-size quantile that drives coarsening.
    pub fn with_next_cluster_size_quantile(mut self, quantile: f64) -> Self {
        self.params.next_cluster_size_quantile = quantile;
        self
    }

    /// Cap the number of layers.
    pub fn with_max_layers(mut self, max_layers: usize) -> Self {
        self.params.max_layers = Some(max_layers);
        self
    }

    /// Current layering parameters.
    pub fn params(&self) -> &LayerParams {
        &self.params
    }
}

impl<C: DensityClustering> LayeredClustering for DensityStrategy<C> {
    fn label_layers(&self, clusterable: ArrayView2<'_, f32>) -> Result<Vec<Vec<Label>>> {
        build_raw_cluster_layers(&self.clusterer, clusterable, &self.params)
    }

    fn min_clusters(&self) -> usize {
        self.params.min_clusters
    }

    fn max_layers(&self) -> Option<usize> {
        self.params.max_layers
    }
}
