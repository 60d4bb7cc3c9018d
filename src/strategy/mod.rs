//! Layered clustering strategies.
//!
//! A strategy turns points into a stack of label layers plus the containment
//! tree over them. Strategies differ only in how the raw label layers are
//! produced; the finishing steps are shared:
//!
//! ```text
//! clusterable ──► label_layers() ──► degenerate check ──► max_layers cut
//!                                                              │
//!                 embeddings ──► centroids ──► layer_ctor ◄────┤
//!                                                              ▼
//!                                                     build_cluster_tree
//! ```
//!
//! | Strategy | Raw layers from | Noise |
//! |----------|-----------------|-------|
//! | [`DensityStrategy`] | one density hierarchy cut at growing sizes | yes |
//! | [`PartitionStrategy`] | k-means on points, then on centroids | no |
//! | [`EnsembleStrategy`] | consensus vote at several agreement levels | yes |
//!
//! Clusterable vectors are what clustering runs on (often a low-dimensional
//! projection); embeddings are what centroids are computed in. Both have one
//! row per point.
//!
//! # Example
//!
//! ```rust
//! use ndarray::Array2;
//! use stratum::strategy::{LayeredClustering, PartitionStrategy};
//! use stratum::LabelLayer;
//!
//! let points = Array2::from_shape_fn((40, 2), |(i, j)| ((i / 10) * 10 + j) as f32 + (i % 10) as f32 * 0.01);
//! let strategy = PartitionStrategy::new()
//!     .with_base_n_clusters(8)
//!     .with_min_clusters(2)
//!     .with_seed(7);
//!
//! let (layers, tree) = strategy
//!     .fit_predict(points.view(), points.view(), LabelLayer::new)
//!     .unwrap();
//! assert_eq!(layers.len(), 3);
//! assert_eq!(tree.n_layers(), 3);
//! ```

mod density;
mod ensemble;
mod partition;

pub use density::DensityStrategy;
pub use ensemble::EnsembleStrategy;
pub use partition::PartitionStrategy;

use crate::error::{Error, Result};
use crate::hierarchy::{build_cluster_tree, create_cluster_layers, ClusterTree};
use crate::labels::{n_clusters, Label, NOISE};
use ndarray::{Array2, ArrayView2};

/// Produce label layers and a containment tree from points.
///
/// Only [`label_layers`](LayeredClustering::label_layers) is required. A
/// strategy with its own cluster minimum or layer cap overrides
/// [`min_clusters`](LayeredClustering::min_clusters) and
/// [`max_layers`](LayeredClustering::max_layers).
pub trait LayeredClustering {
    /// Raw label layers for `clusterable`, finest first.
    fn label_layers(&self, clusterable: ArrayView2<'_, f32>) -> Result<Vec<Vec<Label>>>;

    /// Fewest clusters the finest layer must have to be kept as is.
    ///
    /// Defaults to one: only a finest layer without any cluster is degenerate.
    fn min_clusters(&self) -> usize {
        1
    }

    /// Cap on the number of emitted layers. Uncapped by default.
    fn max_layers(&self) -> Option<usize> {
        None
    }

    /// Final label layers: raw layers after degenerate recovery and the
    /// `max_layers` cut.
    fn fit_labels(&self, clusterable: ArrayView2<'_, f32>) -> Result<Vec<Vec<Label>>> {
        if clusterable.nrows() == 0 {
            return Err(Error::EmptyInput);
        }
        let raw = self.label_layers(clusterable)?;
        let mut layers = recover_degenerate(raw, clusterable.nrows(), self.min_clusters())?;
        if let Some(max) = self.max_layers() {
            layers.truncate(max);
        }
        Ok(layers)
    }

    /// Cluster `clusterable`, compute centroids in `embeddings`, and build the
    /// layer objects with `layer_ctor` together with their containment tree.
    ///
    /// # Errors
    ///
    /// [`Error::ShapeMismatch`] when the two matrices disagree on the point
    /// count, parameter errors, and whatever the clustering collaborator
    /// returns.
    fn fit_predict<L, F>(
        &self,
        clusterable: ArrayView2<'_, f32>,
        embeddings: ArrayView2<'_, f32>,
        layer_ctor: F,
    ) -> Result<(Vec<L>, ClusterTree)>
    where
        F: FnMut(Vec<Label>, Array2<f32>) -> L,
    {
        if clusterable.nrows() != embeddings.nrows() {
            return Err(Error::shape(
                format!("{} embedding rows", clusterable.nrows()),
                format!("{} embedding rows", embeddings.nrows()),
            ));
        }
        let layers = self.fit_labels(clusterable)?;
        let tree = build_cluster_tree(&layers)?;
        let built = create_cluster_layers(layers, embeddings, layer_ctor)?;
        Ok((built, tree))
    }
}

/// Fail when the finest layer has too few clusters.
fn check_finest(layers: &[Vec<Label>], min_clusters: usize) -> Result<()> {
    let found = layers.first().map_or(0, |l| n_clusters(l));
    if found < min_clusters {
        return Err(Error::DegenerateClustering {
            found,
            required: min_clusters,
        });
    }
    Ok(())
}

/// Replace a degenerate stack with a single layer.
///
/// Every point goes to cluster 0 if the finest layer found any cluster at
/// all, otherwise every point is noise.
pub(crate) fn recover_degenerate(
    layers: Vec<Vec<Label>>,
    n_points: usize,
    min_clusters: usize,
) -> Result<Vec<Vec<Label>>> {
    match check_finest(&layers, min_clusters) {
        Ok(()) => Ok(layers),
        Err(Error::DegenerateClustering { found, required }) => {
            log::warn!(
                "finest layer has {} clusters, fewer than {}; emitting a single layer",
                found,
                required
            );
            let label = if found > 0 { 0 } else { NOISE };
            Ok(vec![vec![label; n_points]])
        }
        Err(e) => Err(e),
    }
}

/// Any of the provided strategies, chosen at runtime.
#[derive(Debug, Clone)]
pub enum Strategy {
    /// Density layering.
    Density(DensityStrategy),
    /// Centroid-partition layering.
    Partition(PartitionStrategy),
    /// Ensemble-vote layering.
    Ensemble(EnsembleStrategy),
}

impl From<DensityStrategy> for Strategy {
    fn from(s: DensityStrategy) -> Self {
        Strategy::Density(s)
    }
}

impl From<PartitionStrategy> for Strategy {
    fn from(s: PartitionStrategy) -> Self {
        Strategy::Partition(s)
    }
}

impl From<EnsembleStrategy> for Strategy {
    fn from(s: EnsembleStrategy) -> Self {
        Strategy::Ensemble(s)
    }
}

impl LayeredClustering for Strategy {
    fn label_layers(&self, clusterable: ArrayView2<'_, f32>) -> Result<Vec<Vec<Label>>> {
        match self {
            Strategy::Density(s) => s.label_layers(clusterable),
            Strategy::Partition(s) => s.label_layers(clusterable),
            Strategy::Ensemble(s) => s.label_layers(clusterable),
        }
    }

    fn min_clusters(&self) -> usize {
        match self {
            Strategy::Density(s) => s.min_clusters(),
            Strategy::Partition(s) => s.min_clusters(),
            Strategy::Ensemble(s) => s.min_clusters(),
        }
    }

    fn max_layers(&self) -> Option<usize> {
        match self {
            Strategy::Density(s) => s.max_layers(),
            Strategy::Partition(s) => s.max_layers(),
            Strategy::Ensemble(s) => s.max_layers(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use ndarray::Array2;

    /// Returns a fixed stack regardless of input.
    struct Fixed(Vec<Vec<Label>>, usize, Option<usize>);

    impl LayeredClustering for Fixed {
        fn label_layers(&self, _clusterable: ArrayView2<'_, f32>) -> Result<Vec<Vec<Label>>> {
            Ok(self.0.clone())
        }

        fn min_clusters(&self) -> usize {
            self.1
        }

        fn max_layers(&self) -> Option<usize> {
            self.2
        }
    }

    /// Implements only the required method.
    struct Bare(Vec<Vec<Label>>);

    impl LayeredClustering for Bare {
        fn label_layers(&self, _clusterable: ArrayView2<'_, f32>) -> Result<Vec<Vec<Label>>> {
            Ok(self.0.clone())
        }
    }

    fn stack() -> Vec<Vec<Label>> {
        vec![
            vec![0, 0, 1, 1, 2, 2],
            vec![0, 0, 0, 0, 1, 1],
            vec![0, 0, 0, 0, 0, 0],
        ]
    }

    #[test]
    fn test_fit_predict_builds_layers_and_tree() {
        let data = Array2::from_shape_fn((6, 2), |(i, j)| (i + j) as f32);
        let (layers, tree) = Fixed(stack(), 2, None)
            .fit_predict(data.view(), data.view(), |labels, centroids| {
                (labels, centroids.nrows())
            })
            .unwrap();

        assert_eq!(layers.len(), 3);
        assert_eq!(layers[0].1, 3);
        assert_eq!(tree.n_layers(), 3);
        assert_eq!(tree.len(), 3 + 2 + 1);
    }

    #[test]
    fn test_max_layers_rebuilds_tree_over_kept_layers() {
        let data = Array2::<f32>::zeros((6, 1));
        let (layers, tree) = Fixed(stack(), 2, Some(2))
            .fit_predict(data.view(), data.view(), |labels, _| labels)
            .unwrap();

        assert_eq!(layers.len(), 2);
        assert_eq!(tree.n_layers(), 2);
        assert_eq!(tree.root().layer, 2);
        assert_eq!(tree.top_level().len(), 2);
    }

    #[test]
    fn test_degenerate_finest_collapses_to_one_cluster() {
        let labels = Fixed(vec![vec![0, 0, NOISE, 1]], 4, None)
            .fit_labels(Array2::<f32>::zeros((4, 1)).view())
            .unwrap();
        assert_eq!(labels, vec![vec![0, 0, 0, 0]]);
    }

    #[test]
    fn test_degenerate_all_noise_stays_noise() {
        let labels = Fixed(vec![vec![NOISE; 3]], 1, None)
            .fit_labels(Array2::<f32>::zeros((3, 1)).view())
            .unwrap();
        assert_eq!(labels, vec![vec![NOISE; 3]]);

        let labels = Fixed(Vec::new(), 1, None)
            .fit_labels(Array2::<f32>::zeros((3, 1)).view())
            .unwrap();
        assert_eq!(labels, vec![vec![NOISE; 3]]);
    }

    #[test]
    fn test_shape_and_empty_errors() {
        let a = Array2::<f32>::zeros((6, 2));
        let b = Array2::<f32>::zeros((5, 2));
        let err = Fixed(stack(), 2, None)
            .fit_predict(a.view(), b.view(), |labels, _| labels)
            .unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));

        let empty = Array2::<f32>::zeros((0, 2));
        let err = Fixed(stack(), 2, None).fit_labels(empty.view()).unwrap_err();
        assert_eq!(err, Error::EmptyInput);
    }

    #[test]
    fn test_default_limits_keep_everything_but_empty_layers() {
        let data = Array2::<f32>::zeros((6, 1));
        let (layers, tree) = Bare(stack())
            .fit_predict(data.view(), data.view(), |labels, _| labels)
            .unwrap();
        assert_eq!(layers, stack());
        assert_eq!(tree.n_layers(), 3);

        // A single cluster satisfies the default minimum; no cluster does not.
        let points = Array2::<f32>::zeros((3, 1));
        let one = Bare(vec![vec![0, 0, NOISE]]).fit_labels(points.view()).unwrap();
        assert_eq!(one, vec![vec![0, 0, NOISE]]);
        let none = Bare(vec![vec![NOISE; 3], vec![0; 3]])
            .fit_labels(points.view())
            .unwrap();
        assert_eq!(none, vec![vec![NOISE; 3]]);
    }

    #[test]
    fn test_check_finest_reports_counts() {
        assert_eq!(
            check_finest(&[vec![0, 1]], 3),
            Err(Error::DegenerateClustering { found: 2, required: 3 })
        );
        assert!(check_finest(&[vec![0, 1, 2]], 3).is_ok());
    }
}
