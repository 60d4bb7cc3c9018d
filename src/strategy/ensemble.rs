//! Ensemble layering: resolutions from a consensus clustering procedure.
//!
//! The collaborator returns label vectors in whatever order it produces them.
//! They are sorted fine to coarse by cluster count, identical neighbours are
//! dropped, and coarse layers with fewer than `min_clusters` clusters are cut.

use super::LayeredClustering;
use crate::cluster::{EnsembleClustering, VotingEnsemble};
use crate::error::{Error, Result};
use crate::hierarchy::validate_max_layers;
use crate::labels::{n_clusters, same_partition, validate_labels, Label};
use ndarray::ArrayView2;

/// Layers from an [`EnsembleClustering`] collaborator.
#[derive(Debug, Clone)]
pub struct EnsembleStrategy<E = VotingEnsemble> {
    ensemble: E,
    min_clusters: usize,
    max_layers: Option<usize>,
}

impl Default for EnsembleStrategy<VotingEnsemble> {
    fn default() -> Self {
        Self::with_ensemble(VotingEnsemble::default())
    }
}

impl EnsembleStrategy<VotingEnsemble> {
    /// Ensemble layering with the default [`VotingEnsemble`].
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: EnsembleClustering> EnsembleStrategy<E> {
    /// Ensemble layering over a custom collaborator.
    pub fn with_ensemble(ensemble: E) -> Self {
        Self {
            ensemble,
            min_clusters: 6,
            max_layers: None,
        }
    }

    /// Set the minimum number of clusters per layer.
    pub fn with_min_clusters(mut self, min_clusters: usize) -> Self {
        self.min_clusters = min_clusters;
        self
    }

    /// Cap the number of layers.
    pub fn with_max_layers(mut self, max_layers: usize) -> Self {
        self.max_layers = Some(max_layers);
        self
    }

    /// The ensemble collaborator.
    pub fn ensemble(&self) -> &E {
        &self.ensemble
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if self.min_clusters == 0 {
            return Err(Error::InvalidParameter {
                name: "min_clusters",
                message: "must be at least 1",
            });
        }
        validate_max_layers(self.max_layers)
    }
}

/// Order fine to coarse and drop layers that add nothing.
///
/// The finest layer is kept even when it has too few clusters; degenerate
/// recovery deals with it.
fn order_layers(mut layers: Vec<Vec<Label>>, min_clusters: usize) -> Vec<Vec<Label>> {
    // Stable: equal counts keep the collaborator's order.
    layers.sort_by_key(|l| std::cmp::Reverse(n_clusters(l)));

    let mut out: Vec<Vec<Label>> = Vec::with_capacity(layers.len());
    for labels in layers {
        match out.last() {
            None => out.push(labels),
            Some(previous) => {
                if same_partition(previous, &labels) {
                    continue;
                }
                if n_clusters(&labels) < min_clusters {
                    log::debug!(
                        "dropping ensemble layer with {} clusters (< {})",
                        n_clusters(&labels),
                        min_clusters
                    );
                    continue;
                }
                out.push(labels);
            }
        }
    }
    out
}

impl<E: EnsembleClustering> LayeredClustering for EnsembleStrategy<E> {
    fn label_layers(&self, clusterable: ArrayView2<'_, f32>) -> Result<Vec<Vec<Label>>> {
        self.validate()?;
        let raw = self.ensemble.cluster_layers(clusterable)?;
        for labels in &raw {
            validate_labels(labels, clusterable.nrows())?;
        }
        let layers = order_layers(raw, self.min_clusters);
        log::debug!("ensemble produced {} usable layers", layers.len());
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
    use crate::labels::NOISE;
    use ndarray::Array2;

    /// Hands back fixed layers in the order given.
    struct Scripted(Vec<Vec<Label>>);

    impl EnsembleClustering for Scripted {
        fn cluster_layers(&self, _data: ArrayView2<'_, f32>) -> Result<Vec<Vec<Label>>> {
            Ok(self.0.clone())
        }
    }

    fn data(n: usize) -> Array2<f32> {
        Array2::zeros((n, 2))
    }

    #[test]
    fn test_orders_fine_to_coarse() {
        let coarse = vec![0, 0, 0, 1, 1, 1];
        let fine = vec![0, 1, 2, 3, 4, 5];
        let mid = vec![0, 0, 1, 1, 2, 2];
        let s = EnsembleStrategy::with_ensemble(Scripted(vec![coarse.clone(), fine.clone(), mid.clone()]))
            .with_min_clusters(2);

        let layers = s.label_layers(data(6).view()).unwrap();
        assert_eq!(layers, vec![fine, mid, coarse]);
    }

    #[test]
    fn test_drops_duplicates_and_small_layers() {
        let fine = vec![0, 0, 1, 1, 2, 2];
        let renamed = vec![2, 2, 0, 0, 1, 1];
        let single = vec![0, 0, 0, 0, 0, NOISE];
        let s = EnsembleStrategy::with_ensemble(Scripted(vec![fine.clone(), renamed, single]))
            .with_min_clusters(2);

        let layers = s.label_layers(data(6).view()).unwrap();
        assert_eq!(layers, vec![fine]);
    }

    #[test]
    fn test_degenerate_finest_goes_through_recovery() {
        let s = EnsembleStrategy::with_ensemble(Scripted(vec![vec![0, 0, NOISE]]))
            .with_min_clusters(3);
        let layers = s.fit_labels(data(3).view()).unwrap();
        assert_eq!(layers, vec![vec![0, 0, 0]]);
    }

    #[test]
    fn test_rejects_wrong_length_layers() {
        let s = EnsembleStrategy::with_ensemble(Scripted(vec![vec![0, 1]])).with_min_clusters(1);
        let err = s.label_layers(data(3).view()).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_voting_ensemble_default_strategy() {
        let points = Array2::from_shape_fn((60, 2), |(i, j)| {
            let g = (i / 20) as f32;
            let offset = (i % 20) as f32 * 0.01;
            if j == 0 {
                g * 10.0 + offset
            } else {
                offset
            }
        });
        let ensemble = VotingEnsemble::new()
            .with_k_range(3, 4)
            .with_n_members(12)
            .with_vote_thresholds(vec![0.5])
            .with_min_cluster_size(5)
            .with_seed(1);
        let layers = EnsembleStrategy::with_ensemble(ensemble)
            .with_min_clusters(3)
            .fit_labels(points.view())
            .unwrap();
        assert_eq!(layers.len(), 1);
        assert_eq!(n_clusters(&layers[0]), 3);
    }
}
