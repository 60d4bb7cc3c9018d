//! Containment tree across layers.
//!
//! Every cluster of every layer gets exactly one parent: the cluster in the
//! nearest coarser layer that holds most of its points. A cluster whose points
//! are noise in every coarser layer hangs off an artificial root, which sits
//! at layer index `L` (one past the coarsest real layer).
//!
//! ```text
//! root (3, 0)
//! ├── (2, 0)
//! │   ├── (1, 0)
//! │   │   ├── (0, 0)
//! │   │   └── (0, 1)
//! │   └── (1, 1)
//! │       └── (0, 2)
//! └── (0, 3)          all noise above layer 0
//! ```
//!
//! Nodes are `(layer, cluster)` pairs, never references into the layers.

use crate::error::{Error, Result};
use crate::labels::{n_clusters, validate_labels, Label};
use std::collections::BTreeMap;
use std::fmt;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A cluster in a layer stack: `(layer, cluster id)`.
///
/// Ordered by layer, then cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClusterRef {
    /// Layer index, `0` = finest.
    pub layer: usize,
    /// Cluster id within the layer.
    pub cluster: usize,
}

impl ClusterRef {
    /// Create a reference.
    pub const fn new(layer: usize, cluster: usize) -> Self {
        Self { layer, cluster }
    }
}

impl fmt::Display for ClusterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.layer, self.cluster)
    }
}

/// Parent/child containment between clusters of a layer stack.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClusterTree {
    n_layers: usize,
    /// Parent -> children, children ascending.
    children: BTreeMap<ClusterRef, Vec<ClusterRef>>,
    /// Child -> parent.
    parents: BTreeMap<ClusterRef, ClusterRef>,
}

impl ClusterTree {
    /// Empty tree over `n_layers` layers.
    pub fn new(n_layers: usize) -> Self {
        Self {
            n_layers,
            children: BTreeMap::new(),
            parents: BTreeMap::new(),
        }
    }

    /// Number of real layers; the root lives at this layer index.
    pub fn n_layers(&self) -> usize {
        self.n_layers
    }

    /// The artificial root `(L, 0)`.
    pub fn root(&self) -> ClusterRef {
        ClusterRef::new(self.n_layers, 0)
    }

    /// Record `child` under `parent`.
    ///
    /// # Errors
    ///
    /// [`Error::TreeInconsistency`] if `child` already has a parent or `parent`
    /// is not in a strictly coarser layer.
    pub fn attach(&mut self, parent: ClusterRef, child: ClusterRef) -> Result<()> {
        if parent.layer <= child.layer {
            return Err(Error::TreeInconsistency(format!(
                "parent {parent} is not coarser than child {child}"
            )));
        }
        if parent.layer > self.n_layers || (parent.layer == self.n_layers && parent != self.root()) {
            return Err(Error::TreeInconsistency(format!(
                "parent {parent} lies beyond the root layer {}",
                self.n_layers
            )));
        }
        if let Some(existing) = self.parents.get(&child) {
            return Err(Error::TreeInconsistency(format!(
                "child {child} already attached to {existing}, not {parent}"
            )));
        }
        let _ = self.parents.insert(child, parent);
        let siblings = self.children.entry(parent).or_default();
        let pos = siblings.partition_point(|c| *c < child);
        siblings.insert(pos, child);
        Ok(())
    }

    /// Direct children of `parent`, ascending.
    pub fn children(&self, parent: ClusterRef) -> &[ClusterRef] {
        self.children.get(&parent).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Parent of `child`, if attached.
    pub fn parent(&self, child: ClusterRef) -> Option<ClusterRef> {
        self.parents.get(&child).copied()
    }

    /// `(parent, children)` pairs in parent order.
    pub fn iter(&self) -> impl Iterator<Item = (ClusterRef, &[ClusterRef])> {
        self.children.iter().map(|(p, c)| (*p, c.as_slice()))
    }

    /// Number of parent/child edges (one per attached cluster).
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    /// True when no cluster is attached.
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Clusters attached directly to the root.
    pub fn top_level(&self) -> &[ClusterRef] {
        self.children(self.root())
    }

    /// Edges between `node` and the root; `None` for unattached clusters.
    pub fn depth(&self, node: ClusterRef) -> Option<usize> {
        let root = self.root();
        let mut current = node;
        let mut depth = 0;
        while current != root {
            current = self.parent(current)?;
            depth += 1;
        }
        Some(depth)
    }

    /// Every cluster below `node`, ascending.
    pub fn descendants(&self, node: ClusterRef) -> Vec<ClusterRef> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            for &child in self.children(current) {
                out.push(child);
                stack.push(child);
            }
        }
        out.sort_unstable();
        out
    }
}

/// Parent of each cluster in layer `child_layer`, clusters in id order.
fn layer_parents(layers: &[Vec<Label>], child_layer: usize) -> Vec<(ClusterRef, ClusterRef)> {
    let labels = &layers[child_layer];
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); n_clusters(labels)];
    for (i, &l) in labels.iter().enumerate() {
        if l >= 0 {
            members[l as usize].push(i);
        }
    }

    let root = ClusterRef::new(layers.len(), 0);
    let mut parents: Vec<ClusterRef> = vec![root; members.len()];
    let mut unresolved: Vec<usize> = (0..members.len())
        .filter(|&k| !members[k].is_empty())
        .collect();

    for (p, coarse) in layers.iter().enumerate().skip(child_layer + 1) {
        if unresolved.is_empty() {
            break;
        }
        unresolved.retain(|&k| {
            let mut overlap: BTreeMap<Label, usize> = BTreeMap::new();
            for &i in &members[k] {
                if coarse[i] >= 0 {
                    *overlap.entry(coarse[i]).or_default() += 1;
                }
            }
            // Ascending ids with a strict comparison: ties keep the smallest.
            let mut best: Option<(Label, usize)> = None;
            for (&j, &count) in &overlap {
                if best.map_or(true, |(_, c)| count > c) {
                    best = Some((j, count));
                }
            }
            match best {
                Some((j, _)) => {
                    parents[k] = ClusterRef::new(p, j as usize);
                    false
                }
                None => true,
            }
        });
    }

    parents
        .into_iter()
        .enumerate()
        .map(|(k, parent)| (ClusterRef::new(child_layer, k), parent))
        .collect()
}

/// Build the containment tree of a layer stack, finest layer first.
///
/// Cluster ids `0..=max` of every layer become nodes, including ids that no
/// point carries (those attach to the root).
///
/// # Errors
///
/// [`Error::ShapeMismatch`] when layers disagree on the point count,
/// [`Error::InvalidLabel`] for labels below noise, and
/// [`Error::TreeInconsistency`] if an attachment breaks the tree.
pub fn build_cluster_tree(layers: &[Vec<Label>]) -> Result<ClusterTree> {
    let n_layers = layers.len();
    let mut tree = ClusterTree::new(n_layers);
    let Some(first) = layers.first() else {
        return Ok(tree);
    };
    for labels in layers {
        validate_labels(labels, first.len())?;
    }

    #[cfg(feature = "parallel")]
    let attachments: Vec<Vec<(ClusterRef, ClusterRef)>> = (0..n_layers)
        .into_par_iter()
        .map(|c| layer_parents(layers, c))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let attachments: Vec<Vec<(ClusterRef, ClusterRef)>> =
        (0..n_layers).map(|c| layer_parents(layers, c)).collect();

    for (child, parent) in attachments.into_iter().flatten() {
        tree.attach(parent, child)?;
    }

    log::trace!(
        "cluster tree: {} layers, {} edges, {} top-level clusters",
        n_layers,
        tree.len(),
        tree.top_level().len()
    );
    Ok(tree)
}
