//! # stratum
//!
//! Multi-resolution cluster layers over a point set, linked by a containment
//! tree.
//!
//! A clustering strategy turns the points into several label vectors, finest
//! first. Each layer gets a centroid table in the embedding space, and every
//! cluster is attached to the cluster of the nearest coarser layer that holds
//! most of its points.
//!
//! ```rust
//! use ndarray::Array2;
//! use stratum::{DensityStrategy, LabelLayer, LayeredClustering};
//!
//! // Three tight 4x4 grids, far apart.
//! let points = Array2::from_shape_fn((48, 2), |(i, j)| {
//!     let cell = i % 16;
//!     let offset = (if j == 0 { cell / 4 } else { cell % 4 }) as f32 * 0.1;
//!     (i / 16) as f32 * 30.0 + offset
//! });
//!
//! let strategy = DensityStrategy::new()
//!     .with_min_clusters(2)
//!     .with_min_samples(3)
//!     .with_base_min_cluster_size(9);
//! let (layers, tree) = strategy
//!     .fit_predict(points.view(), points.view(), LabelLayer::new)
//!     .unwrap();
//!
//! assert_eq!(layers[0].n_clusters(), 3);
//! assert_eq!(tree.top_level().len(), 3);
//! ```
//!
//! Building blocks are public too: [`build_raw_cluster_layers`],
//! [`centroids_from_labels`], [`create_cluster_layers`] and
//! [`build_cluster_tree`].

pub mod cluster;
/// Error types used across `stratum`.
pub mod error;
pub mod hierarchy;
pub mod labels;
pub mod metrics;
pub mod strategy;

#[cfg(test)]
mod pipeline_tests;

pub use error::{Error, Result};
pub use labels::{Label, NOISE};
pub use metrics::{ari, nmi};

pub use hierarchy::{
    build_cluster_tree, build_raw_cluster_layers, centroids_from_labels, create_cluster_layers,
    ClusterRef, ClusterTree, Dendrogram, HealthReport, LabelLayer, LayerParams,
};
pub use strategy::{
    DensityStrategy, EnsembleStrategy, LayeredClustering, PartitionStrategy, Strategy,
};
