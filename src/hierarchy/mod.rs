//! Multi-resolution cluster layers and the containment tree linking them.
//!
//! # The Core Insight
//!
//! One clustering is one resolution. Asking "which topics exist?" needs a few
//! broad clusters; asking "what exactly is in here?" needs many small ones.
//! A layer stack keeps several resolutions of the same points side by side:
//!
//! ```text
//! Layer   │ Clusters │ Typical use
//! ────────┼──────────┼───────────────────────
//! 0       │ many     │ fine-grained topics
//! 1       │ fewer    │ themes
//! 2       │ few      │ broad areas
//! root    │ 1        │ artificial, collects the rest
//! ```
//!
//! # Module Overview
//!
//! | Step | Item | Input → Output |
//! |------|------|----------------|
//! | raw layering | [`build_raw_cluster_layers`] | points → label vectors, finest first |
//! | centroids | [`centroids_from_labels`] | labels + vectors → one mean row per cluster |
//! | assembly | [`create_cluster_layers`] | label vectors → caller layer objects |
//! | containment | [`build_cluster_tree`] | label vectors → [`ClusterTree`] |
//! | checking | [`ClusterTree::health_check`] | tree + labels → [`HealthReport`] |
//!
//! The strategies in [`crate::strategy`] drive these steps end to end.
//!
//! ## [`Dendrogram`]
//!
//! Records the merge history of single-linkage clustering. Density layering
//! cuts it at increasing minimum cluster sizes:
//!
//! ```text
//!         6 (height=1.0)
//!        / \
//!       4   5 (height=0.7)
//!      / \ / \
//!     0  1 2  3 (leaves)
//! ```

mod assemble;
mod centroids;
pub(crate) mod dendrogram;
mod layers;
mod tree;
mod validate;

pub use assemble::{create_cluster_layers, LabelLayer};
pub use centroids::centroids_from_labels;
pub use dendrogram::Dendrogram;
pub use layers::{build_raw_cluster_layers, next_min_cluster_size, LayerParams};
pub(crate) use layers::validate_max_layers;
pub use tree::{build_cluster_tree, ClusterRef, ClusterTree};
pub use validate::{HealthReport, Severity, ValidationIssue, ValidationReport};
