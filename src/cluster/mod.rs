//! Clustering collaborators used to produce label layers.
//!
//! The layering core never looks inside these algorithms. It only needs label
//! vectors of the right shape, so each family sits behind a small trait and can
//! be swapped for another implementation.
//!
//! | Trait | Provided | Produces |
//! |-------|----------|----------|
//! | [`DensityClustering`] | [`Hdbscan`] | a hierarchy cut at any minimum cluster size, with noise |
//! | [`Clustering`] | [`Kmeans`] | a flat partition into exactly k clusters |
//! | [`EnsembleClustering`] | [`VotingEnsemble`] | several resolutions from a consensus vote |
//!
//! ## Density vs Partition
//!
//! **Density-based** clustering (HDBSCAN) finds the number of clusters on its
//! own, leaves sparse points as noise, and handles arbitrary shapes. Raising
//! the minimum cluster size on the same fitted hierarchy yields progressively
//! coarser layers that nest.
//!
//! **Partition** clustering (k-means) assigns every point and needs k up front.
//! Layers come from re-clustering the previous layer's centroids.
//!
//! **Ensemble** clustering combines many partitions; points that agree across
//! members stay together, and the required level of agreement sets the
//! resolution.
//!
//! ## Usage
//!
//! ```rust
//! use ndarray::array;
//! use stratum::cluster::{Clustering, DensityClustering, Hdbscan, Kmeans};
//!
//! let data = array![
//!     [0.0f32, 0.0],
//!     [0.1, 0.1],
//!     [10.0, 10.0],
//!     [10.1, 10.1],
//! ];
//!
//! let labels = Kmeans::new(2).with_seed(0).fit_predict(data.view()).unwrap();
//! assert_eq!(labels[0], labels[1]);
//! assert_ne!(labels[0], labels[2]);
//!
//! let density = Hdbscan::new().cluster(data.view(), 2, 1).unwrap();
//! assert_eq!(density.len(), 4);
//! ```

mod ensemble;
mod hdbscan;
mod kmeans;
mod traits;

pub use ensemble::VotingEnsemble;
pub use hdbscan::Hdbscan;
pub use kmeans::{Kmeans, KmeansFit};
pub use traits::{Clustering, DensityClustering, DensityHierarchy, EnsembleClustering};
