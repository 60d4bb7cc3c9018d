//! Per-cluster centroid tables.
//!
//! A centroid table has one row per cluster id of a label vector, and row `k`
//! is the mean of the embedding rows labelled `k`. Callers index it by cluster
//! id, so ids that have no members still get a (zero) row.

use crate::error::{Error, Result};
use crate::labels::{n_clusters, Label};
use ndarray::{Array2, ArrayView2};

/// Compute the centroid of every cluster id in `labels`.
///
/// Noise (`-1`) is ignored. The result has `max(labels) + 1` rows and
/// `vectors.ncols()` columns; a cluster with no members maps to the zero row.
///
/// One grouped pass accumulates sums and counts in `f64`, so the cost is
/// `O(n * d)` regardless of how many clusters there are.
///
/// # Errors
///
/// - [`Error::ShapeMismatch`] if `labels.len() != vectors.nrows()`.
/// - [`Error::InvalidLabel`] if a label is below `-1`.
///
/// # Example
///
/// ```rust
/// use ndarray::array;
/// use stratum::centroids_from_labels;
///
/// let vectors = array![[0.0f32, 0.0], [2.0, 2.0], [9.0, 9.0]];
/// let centroids = centroids_from_labels(&[0, 0, -1], vectors.view()).unwrap();
/// assert_eq!(centroids.nrows(), 1);
/// assert_eq!(centroids[[0, 0]], 1.0);
/// ```
pub fn centroids_from_labels(labels: &[Label], vectors: ArrayView2<'_, f32>) -> Result<Array2<f32>> {
    let (n, d) = vectors.dim();
    if labels.len() != n {
        return Err(Error::shape(
            format!("{n} labels (one per vector row)"),
            format!("{} labels", labels.len()),
        ));
    }

    let k = n_clusters(labels);
    let mut sums = Array2::<f64>::zeros((k, d));
    let mut counts = vec![0usize; k];

    for (index, (&label, row)) in labels.iter().zip(vectors.rows()).enumerate() {
        if label < -1 {
            return Err(Error::InvalidLabel { index, label });
        }
        if label < 0 {
            continue;
        }
        let cluster = label as usize;
        counts[cluster] += 1;
        let mut acc = sums.row_mut(cluster);
        for (a, &x) in acc.iter_mut().zip(row.iter()) {
            *a += f64::from(x);
        }
    }

    let mut out = Array2::<f32>::zeros((k, d));
    for (cluster, &count) in counts.iter().enumerate() {
        if count == 0 {
            continue;
        }
        let denom = count as f64;
        for (o, &s) in out.row_mut(cluster).iter_mut().zip(sums.row(cluster).iter()) {
            *o = (s / denom) as f32;
        }
    }

    Ok(out)
}
