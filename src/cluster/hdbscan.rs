//! HDBSCAN-style density clustering.
//!
//! # The Algorithm (Campello, Moulavi & Sander, 2013)
//!
//! DBSCAN needs a fixed radius ε. HDBSCAN instead considers every radius at
//! once and keeps the clusters that persist:
//!
//! 1. **Core distance**: for each point, the distance to its `min_samples`-th
//!    nearest neighbour (the point itself counts as the first).
//! 2. **Mutual reachability**: `max(core(a), core(b), d(a, b))`. Sparse points
//!    are pushed away from everything, dense regions keep their geometry.
//! 3. **Single-linkage dendrogram** over the condensed mutual-reachability
//!    matrix (`kodama`). Its merges are exactly the minimum spanning tree
//!    edges in ascending order.
//! 4. **Condense** at `min_cluster_size` and take the leaf clusters
//!    (see [`Dendrogram::leaf_cluster_labels`]).
//!
//! Steps 1-3 do not depend on `min_cluster_size`, so [`Hdbscan::fit`] returns
//! the dendrogram and callers cut it as often as they like.
//!
//! ## Complexity
//!
//! - **Time**: O(n² · d) for core distances and the dissimilarity matrix.
//! - **Space**: O(n²) for the condensed matrix.
//!
//! ## References
//!
//! Campello, Moulavi & Sander (2013). "Density-Based Clustering Based on
//! Hierarchical Density Estimates." PAKDD.

use super::traits::{DensityClustering, DensityHierarchy};
use crate::error::{Error, Result};
use crate::hierarchy::dendrogram::condensed_distances;
use crate::hierarchy::Dendrogram;
use crate::labels::Label;
use ndarray::{ArrayView1, ArrayView2};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// HDBSCAN clusterer over Euclidean distance.
#[derive(Debug, Clone, Default)]
pub struct Hdbscan {
    _private: (),
}

impl Hdbscan {
    /// Create a new HDBSCAN clusterer.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn distance(a: ArrayView1<'_, f32>, b: ArrayView1<'_, f32>) -> f64 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| {
                let d = f64::from(x - y);
                d * d
            })
            .sum::<f64>()
            .sqrt()
    }

    fn core_distance(data: ArrayView2<'_, f32>, point: usize, k: usize) -> f64 {
        if k <= 1 {
            return 0.0;
        }
        let row = data.row(point);
        let mut dists: Vec<f64> = data
            .rows()
            .into_iter()
            .map(|other| Self::distance(row, other))
            .collect();
        let (_, kth, _) = dists.select_nth_unstable_by(k - 1, |a, b| a.total_cmp(b));
        *kth
    }

    /// Core distance of every point, `k` counting the point itself.
    fn core_distances(data: ArrayView2<'_, f32>, k: usize) -> Vec<f64> {
        let n = data.nrows();

        #[cfg(feature = "parallel")]
        {
            (0..n)
                .into_par_iter()
                .map(|i| Self::core_distance(data, i, k))
                .collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            (0..n).map(|i| Self::core_distance(data, i, k)).collect()
        }
    }
}

impl DensityClustering for Hdbscan {
    type Hierarchy = Dendrogram;

    fn fit(&self, data: ArrayView2<'_, f32>, min_samples: usize) -> Result<Dendrogram> {
        let n = data.nrows();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if data.ncols() == 0 {
            return Err(Error::InvalidParameter {
                name: "dimension",
                message: "must be at least 1",
            });
        }
        if min_samples == 0 {
            return Err(Error::InvalidParameter {
                name: "min_samples",
                message: "must be at least 1",
            });
        }

        let core = Self::core_distances(data, min_samples.min(n));
        let mut condensed = condensed_distances(n, |i, j| {
            Self::distance(data.row(i), data.row(j))
                .max(core[i])
                .max(core[j])
        });
        let dendrogram = Dendrogram::single_linkage(&mut condensed, n);
        log::trace!("hdbscan: {} points, {} merges", n, dendrogram.n_merges());

        Ok(dendrogram)
    }
}

impl DensityHierarchy for Dendrogram {
    fn labels_at(&self, min_cluster_size: usize) -> Vec<Label> {
        self.leaf_cluster_labels(min_cluster_size)
    }
}
