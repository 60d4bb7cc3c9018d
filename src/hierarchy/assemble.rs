//! Pair label vectors with their centroids and wrap them in caller types.

use super::centroids::centroids_from_labels;
use crate::error::{Error, Result};
use crate::labels::{cluster_sizes, members, n_clusters, Label};
use ndarray::{Array2, ArrayView2};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Build one layer object per label vector, in input order.
///
/// Centroids are computed against `embeddings`, which need not be the space
/// the clustering ran in. `ctor` receives each layer's labels and centroid
/// table and is called finest layer first.
///
/// # Errors
///
/// [`Error::ShapeMismatch`] when a label vector does not have one entry per
/// embedding row, and [`Error::InvalidLabel`] for labels below noise.
pub fn create_cluster_layers<L, F>(
    layers: Vec<Vec<Label>>,
    embeddings: ArrayView2<'_, f32>,
    mut ctor: F,
) -> Result<Vec<L>>
where
    F: FnMut(Vec<Label>, Array2<f32>) -> L,
{
    let n = embeddings.nrows();
    if let Some(bad) = layers.iter().find(|l| l.len() != n) {
        return Err(Error::shape(
            format!("{n} labels per layer"),
            format!("{} labels", bad.len()),
        ));
    }

    #[cfg(feature = "parallel")]
    let centroids: Vec<Array2<f32>> = layers
        .par_iter()
        .map(|labels| centroids_from_labels(labels, embeddings))
        .collect::<Result<_>>()?;

    #[cfg(not(feature = "parallel"))]
    let centroids: Vec<Array2<f32>> = layers
        .iter()
        .map(|labels| centroids_from_labels(labels, embeddings))
        .collect::<Result<_>>()?;

    Ok(layers
        .into_iter()
        .zip(centroids)
        .map(|(labels, c)| ctor(labels, c))
        .collect())
}

/// Plain layer object: labels and their centroid table.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelLayer {
    labels: Vec<Label>,
    centroids: Array2<f32>,
}

impl LabelLayer {
    /// Wrap a label vector and its centroids. Usable directly as the
    /// constructor of [`create_cluster_layers`].
    pub fn new(labels: Vec<Label>, centroids: Array2<f32>) -> Self {
        Self { labels, centroids }
    }

    /// Cluster id per point.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// One row per cluster id.
    pub fn centroids(&self) -> &Array2<f32> {
        &self.centroids
    }

    /// Number of cluster ids, `max(label) + 1`.
    pub fn n_clusters(&self) -> usize {
        n_clusters(&self.labels)
    }

    /// Member count per cluster id.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        cluster_sizes(&self.labels)
    }

    /// Points in `cluster`.
    pub fn members(&self, cluster: usize) -> Vec<usize> {
        members(&self.labels, cluster)
    }
}
