//! Label vectors: one cluster id per point, `-1` for noise.
//!
//! Every layer in a hierarchy is a label vector over the same point set.
//! Non-negative ids are contiguous from `0` within one vector. The helpers here
//! are the shared vocabulary of the layer builder, the tree builder and the
//! strategies.

use crate::error::{Error, Result};
use std::collections::HashMap;

/// Cluster label for one point.
pub type Label = i32;

/// Label of points not assigned to any cluster.
pub const NOISE: Label = -1;

/// Number of cluster ids in `labels` (`max + 1`, `0` when all noise).
pub fn n_clusters(labels: &[Label]) -> usize {
    labels
        .iter()
        .copied()
        .max()
        .map_or(0, |max| if max < 0 { 0 } else { max as usize + 1 })
}

/// Point count per cluster id (a bincount over non-noise labels).
///
/// Index `k` holds the size of cluster `k`; gaps in the ids show up as zeros.
pub fn cluster_sizes(labels: &[Label]) -> Vec<usize> {
    let mut sizes = vec![0usize; n_clusters(labels)];
    for &label in labels {
        if label >= 0 {
            sizes[label as usize] += 1;
        }
    }
    sizes
}

/// Renumber cluster ids to `0..k` in order of first occurrence.
///
/// Noise stays noise. Returns the number of clusters after relabelling.
pub fn relabel_contiguous(labels: &mut [Label]) -> usize {
    let mut mapping: HashMap<Label, Label> = HashMap::new();
    for label in labels.iter_mut() {
        if *label < 0 {
            *label = NOISE;
            continue;
        }
        let next = mapping.len() as Label;
        *label = *mapping.entry(*label).or_insert(next);
    }
    mapping.len()
}

/// Whether two label vectors describe the same partition, up to renaming ids.
///
/// Noise must match noise exactly.
pub fn same_partition(a: &[Label], b: &[Label]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut forward: HashMap<Label, Label> = HashMap::new();
    let mut backward: HashMap<Label, Label> = HashMap::new();
    for (&x, &y) in a.iter().zip(b) {
        if (x < 0) != (y < 0) {
            return false;
        }
        if x < 0 {
            continue;
        }
        if *forward.entry(x).or_insert(y) != y || *backward.entry(y).or_insert(x) != x {
            return false;
        }
    }
    true
}

/// Check that `labels` has one entry per point and no value below [`NOISE`].
pub fn validate_labels(labels: &[Label], n_points: usize) -> Result<()> {
    if labels.len() != n_points {
        return Err(Error::shape(
            format!("{n_points} labels"),
            format!("{} labels", labels.len()),
        ));
    }
    if let Some((index, &label)) = labels.iter().enumerate().find(|(_, &l)| l < NOISE) {
        return Err(Error::InvalidLabel { index, label });
    }
    Ok(())
}

/// Indices of the points labelled `cluster`.
pub fn members(labels: &[Label], cluster: usize) -> Vec<usize> {
    labels
        .iter()
        .enumerate()
        .filter(|(_, &l)| l >= 0 && l as usize == cluster)
        .map(|(i, _)| i)
        .collect()
}
