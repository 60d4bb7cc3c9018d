//! Agreement between two labelings of the same points.
//!
//! Used to compare a layer against ground truth, or two layers against each
//! other. Labels only need to be hashable, so noise (`-1`) is simply one more
//! class.
//!
//! | Metric | Range | Best | Properties |
//! |--------|-------|------|------------|
//! | [`nmi`] | [0, 1] | 1 | Normalized mutual information |
//! | [`ari`] | [-1, 1] | 1 | Adjusted for chance |
//!
//! # Example
//!
//! ```rust
//! use stratum::metrics::{ari, nmi};
//!
//! let layer = [0, 0, 1, 1, -1, 2];
//! let truth = [0, 0, 1, 1, 1, 2];
//!
//! assert!(nmi(&layer, &truth) > 0.5);
//! assert!(ari(&layer, &truth) > 0.0);
//! ```
//!
//! # References
//!
//! - Hubert & Arabie (1985). "Comparing partitions" (ARI)
//! - Strehl & Ghosh (2002). "Cluster ensembles" (NMI)

use std::collections::HashMap;
use std::hash::Hash;

/// Normalized Mutual Information between two labelings.
///
/// ```text
/// NMI(U, V) = 2 * I(U; V) / (H(U) + H(V))
/// ```
///
/// Returns 0 for empty or differently sized inputs and 1 when both labelings
/// are constant.
///
/// ```rust
/// use stratum::metrics::nmi;
///
/// // Same partition, different names
/// assert!((nmi(&[1, 1, 0, 0], &[0, 0, 1, 1]) - 1.0).abs() < 1e-9);
/// assert!(nmi(&[0, 1, 0, 1], &[0, 0, 1, 1]) < 0.5);
/// ```
pub fn nmi<T: Copy + Eq + Hash>(pred: &[T], truth: &[T]) -> f64 {
    if pred.len() != truth.len() || pred.is_empty() {
        return 0.0;
    }

    let n_f = pred.len() as f64;
    let joint = contingency_table(pred, truth);
    let p_pred = counts(pred);
    let p_truth = counts(truth);

    let h_pred = entropy(&p_pred, n_f);
    let h_truth = entropy(&p_truth, n_f);

    let mut mi = 0.0;
    for (&(p, t), &count) in &joint {
        let p_joint = count as f64 / n_f;
        let p_p = p_pred.get(&p).copied().unwrap_or(0) as f64 / n_f;
        let p_t = p_truth.get(&t).copied().unwrap_or(0) as f64 / n_f;
        if p_p > 0.0 && p_t > 0.0 {
            mi += p_joint * (p_joint / (p_p * p_t)).ln();
        }
    }

    let denom = h_pred + h_truth;
    if denom > 0.0 {
        2.0 * mi / denom
    } else {
        1.0
    }
}

/// Adjusted Rand Index between two labelings.
///
/// 0 for chance-level agreement, 1 for identical partitions.
pub fn ari<T: Copy + Eq + Hash>(pred: &[T], truth: &[T]) -> f64 {
    if pred.len() != truth.len() || pred.is_empty() {
        return 0.0;
    }

    let joint = contingency_table(pred, truth);

    let sum_comb_ij: f64 = joint.values().map(|&c| comb2(c) as f64).sum();
    let sum_comb_a: f64 = counts(pred).values().map(|&a| comb2(a) as f64).sum();
    let sum_comb_b: f64 = counts(truth).values().map(|&b| comb2(b) as f64).sum();
    let comb_n = comb2(pred.len()) as f64;

    if comb_n == 0.0 {
        return 1.0;
    }
    let expected = sum_comb_a * sum_comb_b / comb_n;
    let max_index = (sum_comb_a + sum_comb_b) / 2.0;

    let denom = max_index - expected;
    if denom.abs() < 1e-10 {
        return 1.0;
    }

    (sum_comb_ij - expected) / denom
}

fn contingency_table<T: Copy + Eq + Hash>(pred: &[T], truth: &[T]) -> HashMap<(T, T), usize> {
    let mut table = HashMap::new();
    for (&p, &t) in pred.iter().zip(truth.iter()) {
        *table.entry((p, t)).or_insert(0) += 1;
    }
    table
}

fn counts<T: Copy + Eq + Hash>(labels: &[T]) -> HashMap<T, usize> {
    let mut out = HashMap::new();
    for &l in labels {
        *out.entry(l).or_insert(0) += 1;
    }
    out
}

fn entropy<T>(counts: &HashMap<T, usize>, n: f64) -> f64 {
    counts
        .values()
        .map(|&c| {
            let p = c as f64 / n;
            if p > 0.0 {
                -p * p.ln()
            } else {
                0.0
            }
        })
        .sum()
}

fn comb2(n: usize) -> usize {
    if n < 2 {
        0
    } else {
        n * (n - 1) / 2
    }
}
