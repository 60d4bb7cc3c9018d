//! Single-linkage dendrogram and condensed-tree leaf extraction.
//!
//! A dendrogram records the full merge history of a single-linkage
//! clustering. Leaves are the points `0..n`; merge `i` creates node `n + i`.
//!
//! Density layering cuts the *same* dendrogram at several minimum cluster
//! sizes. For a given `min_cluster_size` the dendrogram is condensed: walking
//! down from the root, a merge whose children both hold at least
//! `min_cluster_size` points is a real split; anything smaller merely sheds
//! points. The clusters that never split again are the leaves of the condensed
//! tree, and every point under a leaf belongs to it. Everything else is noise.
//!
//! Because larger thresholds can only remove splits, the leaves for a larger
//! threshold are unions of leaves for a smaller one (or disjoint from them),
//! which is what makes the resulting layers nest.

use crate::labels::{relabel_contiguous, Label, NOISE};
use kodama::{linkage as kodama_linkage, Method as KodamaMethod};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Condensed dissimilarity matrix (upper triangle, row-major) of `n` items.
///
/// Length is N-choose-2; entry for `i < j` is `dissimilarity(i, j)`.
pub(crate) fn condensed_distances<F>(n: usize, dissimilarity: F) -> Vec<f64>
where
    F: Fn(usize, usize) -> f64 + Sync,
{
    if n < 2 {
        return Vec::new();
    }

    #[cfg(feature = "parallel")]
    {
        (0..n - 1)
            .into_par_iter()
            .flat_map_iter(|row| ((row + 1)..n).map(move |col| (row, col)))
            .map(|(row, col)| dissimilarity(row, col))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        let mut condensed = Vec::with_capacity((n * (n - 1)) / 2);
        for row in 0..(n - 1) {
            for col in (row + 1)..n {
                condensed.push(dissimilarity(row, col));
            }
        }
        condensed
    }
}

/// A dendrogram representing hierarchical cluster merges.
///
/// Each merge combines two clusters into one, recording:
/// - Which clusters were merged
/// - The distance at which they merged
/// - The size of the resulting cluster
#[derive(Debug, Clone)]
pub struct Dendrogram {
    merges: Vec<Merge>,
    n_items: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Merge {
    cluster_a: usize,
    cluster_b: usize,
    distance: f64,
    size: usize,
}

impl Dendrogram {
    /// Create an empty dendrogram over `n_items` points.
    pub fn new(n_items: usize) -> Self {
        Self {
            merges: Vec::with_capacity(n_items.saturating_sub(1)),
            n_items,
        }
    }

    /// Record a merge operation. Node ids refer to points (`< n_items`) or to
    /// earlier merges (`n_items + i`).
    pub fn add_merge(&mut self, cluster_a: usize, cluster_b: usize, distance: f64, size: usize) {
        self.merges.push(Merge {
            cluster_a,
            cluster_b,
            distance,
            size,
        });
    }

    /// Single-linkage dendrogram over a condensed dissimilarity matrix of
    /// `n_items` items (see [`condensed_distances`]).
    ///
    /// The matrix is used as scratch space.
    pub(crate) fn single_linkage(condensed: &mut [f64], n_items: usize) -> Self {
        let mut dendro = Self::new(n_items);
        if n_items < 2 {
            return dendro;
        }

        // kodama labels leaves 0..n-1 and gives merge i the id n+i, which is
        // the node numbering used here.
        let dend = kodama_linkage(condensed, n_items, KodamaMethod::Single);
        for step in dend.steps() {
            dendro.add_merge(step.cluster1, step.cluster2, step.dissimilarity, step.size);
        }
        dendro
    }

    /// Number of original items.
    pub fn n_items(&self) -> usize {
        self.n_items
    }

    /// Number of merges recorded.
    pub fn n_merges(&self) -> usize {
        self.merges.len()
    }

    fn node_size(&self, node: usize) -> usize {
        if node < self.n_items {
            1
        } else {
            self.merges[node - self.n_items].size
        }
    }

    fn node_children(&self, node: usize) -> Option<(usize, usize)> {
        if node < self.n_items {
            None
        } else {
            let m = &self.merges[node - self.n_items];
            Some((m.cluster_a, m.cluster_b))
        }
    }

    /// Nodes that were never merged into anything (one per connected component).
    fn top_nodes(&self) -> Vec<usize> {
        let total = self.n_items + self.merges.len();
        let mut has_parent = vec![false; total];
        for m in &self.merges {
            has_parent[m.cluster_a] = true;
            has_parent[m.cluster_b] = true;
        }
        (0..total).filter(|&node| !has_parent[node]).collect()
    }

    /// Label every point by the condensed-tree leaf it falls under.
    ///
    /// Points outside every leaf are [`NOISE`]. Ids are numbered by first
    /// occurrence in point order. When the whole data set never splits into
    /// two parts of at least `min_cluster_size`, every point lands in
    /// cluster `0`; with fewer than `min_cluster_size` points in total, all are
    /// noise.
    pub fn leaf_cluster_labels(&self, min_cluster_size: usize) -> Vec<Label> {
        let n = self.n_items;
        let mut labels = vec![NOISE; n];
        if n == 0 || n < min_cluster_size {
            return labels;
        }

        // Condensed-cluster starting nodes still to explore.
        let tops = self.top_nodes();
        let mut stack: Vec<usize> = if tops.len() == 1 {
            tops
        } else {
            // A disconnected forest behaves like a virtual root split.
            tops.into_iter()
                .rev()
                .filter(|&t| self.node_size(t) >= min_cluster_size)
                .collect()
        };

        let mut leaves: Vec<usize> = Vec::new();
        while let Some(start) = stack.pop() {
            let mut node = start;
            loop {
                let Some((a, b)) = self.node_children(node) else {
                    leaves.push(start);
                    break;
                };
                let (size_a, size_b) = (self.node_size(a), self.node_size(b));
                if size_a >= min_cluster_size && size_b >= min_cluster_size {
                    stack.push(b);
                    stack.push(a);
                    break;
                } else if size_a >= min_cluster_size {
                    node = a;
                } else if size_b >= min_cluster_size {
                    node = b;
                } else {
                    leaves.push(start);
                    break;
                }
            }
        }

        let mut pending: Vec<usize> = Vec::new();
        for (cluster, &leaf) in leaves.iter().enumerate() {
            pending.push(leaf);
            while let Some(node) = pending.pop() {
                match self.node_children(node) {
                    Some((a, b)) => {
                        pending.push(a);
                        pending.push(b);
                    }
                    None => labels[node] = cluster as Label,
                }
            }
        }

        let _ = relabel_contiguous(&mut labels);
        labels
    }

    /// Connected components when only merges at distance `<= max_distance`
    /// are kept.
    ///
    /// Returns, for every point, the id of the topmost node of its component
    /// (the point itself when it merges with nothing under the cut). Merge
    /// distances must be non-decreasing towards the root, as they are for
    /// single linkage.
    pub fn components_within(&self, max_distance: f64) -> Vec<usize> {
        let n = self.n_items;
        let mut owner: Vec<usize> = (0..n + self.merges.len()).collect();
        // Parents have larger ids than their children, so walking backwards
        // hands each component's top id down before its members are visited.
        for (i, m) in self.merges.iter().enumerate().rev() {
            if m.distance > max_distance {
                continue;
            }
            let top = owner[n + i];
            owner[m.cluster_a] = top;
            owner[m.cluster_b] = top;
        }
        owner.truncate(n);
        owner
    }
}
