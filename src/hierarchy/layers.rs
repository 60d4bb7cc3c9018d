//! Raw layer building: from one density hierarchy to a stack of label vectors.
//!
//! The density hierarchy is fitted once. The finest layer is its cut at
//! `base_min_cluster_size`. Each coarser layer raises the minimum cluster size
//! to a quantile of the previous layer's cluster sizes, so small clusters can
//! no longer stand alone and fold into their neighbours:
//!
//! ```text
//! layer 0   mcs = 10    ▪▪ ▪▪▪ ▪ ▪▪ ▪▪▪ ▪▪ ▪
//! layer 1   mcs = 38    ▬▬▬▬▬  ▬▬▬  ▬▬▬▬▬▬
//! layer 2   mcs = 121   ▬▬▬▬▬▬▬▬▬▬  ▬▬▬▬▬▬
//! ```
//!
//! A cut that changes nothing is skipped and the threshold keeps rising: with
//! equally sized clusters the quantile lands on the cluster size itself, and
//! only larger thresholds merge anything. Building stops when a cut has fewer
//! than `min_clusters` clusters, when the threshold exceeds the point count,
//! or when `max_layers` layers exist.

use crate::cluster::{DensityClustering, DensityHierarchy};
use crate::error::{Error, Result};
use crate::labels::{cluster_sizes, n_clusters, same_partition, Label};
use ndarray::ArrayView2;

/// Parameters of density layering.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayerParams {
    /// Layers with fewer clusters than this are not kept (except the finest).
    pub min_clusters: usize,
    /// Density smoothing: neighbours counted for core distances.
    pub min_samples: usize,
    /// Minimum cluster size of the finest layer.
    pub base_min_cluster_size: usize,
    /// Quantile of the previous layer's cluster sizes that becomes the next
    /// minimum cluster size. In `(0, 1]`.
    pub next_cluster_size_quantile: f64,
    /// Cap on the number of layers.
    pub max_layers: Option<usize>,
}

impl Default for LayerParams {
    fn default() -> Self {
        Self {
            min_clusters: 6,
            min_samples: 5,
            base_min_cluster_size: 10,
            next_cluster_size_quantile: 0.8,
            max_layers: None,
        }
    }
}

impl LayerParams {
    /// Create parameters with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum number of clusters a layer must have.
    pub fn with_min_clusters(mut self, min_clusters: usize) -> Self {
        self.min_clusters = min_clusters;
        self
    }

    /// Set `min_samples`.
    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples;
        self
    }

    /// Set the finest layer's minimum cluster size.
    pub fn with_base_min_cluster_size(mut self, size: usize) -> Self {
        self.base_min_cluster_size = size;
        self
    }

    /// Set the cluster-size quantile that drives coarsening.
    pub fn with_next_cluster_size_quantile(mut self, quantile: f64) -> Self {
        self.next_cluster_size_quantile = quantile;
        self
    }

    /// Cap the number of layers.
    pub fn with_max_layers(mut self, max_layers: usize) -> Self {
        self.max_layers = Some(max_layers);
        self
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if self.min_clusters == 0 {
            return Err(Error::InvalidParameter {
                name: "min_clusters",
                message: "must be at least 1",
            });
        }
        if self.min_samples == 0 {
            return Err(Error::InvalidParameter {
                name: "min_samples",
                message: "must be at least 1",
            });
        }
        if self.base_min_cluster_size < 2 {
            return Err(Error::InvalidParameter {
                name: "base_min_cluster_size",
                message: "must be at least 2",
            });
        }
        let q = self.next_cluster_size_quantile;
        if !(q > 0.0 && q <= 1.0) {
            return Err(Error::InvalidParameter {
                name: "next_cluster_size_quantile",
                message: "must be in (0, 1]",
            });
        }
        validate_max_layers(self.max_layers)
    }
}

pub(crate) fn validate_max_layers(max_layers: Option<usize>) -> Result<()> {
    if max_layers == Some(0) {
        return Err(Error::InvalidParameter {
            name: "max_layers",
            message: "must be at least 1",
        });
    }
    Ok(())
}

/// Linear-interpolation quantile of an ascending slice.
fn quantile(sorted: &[usize], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0] as f64,
        len => {
            let pos = q * (len - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            let frac = pos - lo as f64;
            sorted[lo] as f64 + (sorted[hi] as f64 - sorted[lo] as f64) * frac
        }
    }
}

/// Minimum cluster size for the layer after `labels`.
///
/// The quantile of the non-empty cluster sizes, rounded, and at least one more
/// than the `current` threshold.
pub fn next_min_cluster_size(labels: &[Label], current: usize, quantile_q: f64) -> usize {
    let mut sizes: Vec<usize> = cluster_sizes(labels)
        .into_iter()
        .filter(|&s| s > 0)
        .collect();
    sizes.sort_unstable();
    let proposed = quantile(&sizes, quantile_q).round() as usize;
    proposed.max(current + 1)
}

/// Build the label stack, finest first.
///
/// The first entry is always the cut at `base_min_cluster_size`, even when it
/// has fewer than `min_clusters` clusters (callers decide what to do with a
/// degenerate finest layer).
///
/// # Errors
///
/// Parameter validation errors, and whatever the density collaborator returns.
pub fn build_raw_cluster_layers<C>(
    clusterer: &C,
    data: ArrayView2<'_, f32>,
    params: &LayerParams,
) -> Result<Vec<Vec<Label>>>
where
    C: DensityClustering + ?Sized,
{
    params.validate()?;
    let n = data.nrows();
    let hierarchy = clusterer.fit(data, params.min_samples)?;

    let mut min_cluster_size = params.base_min_cluster_size;
    let finest = hierarchy.labels_at(min_cluster_size);
    log::debug!(
        "layer 0: min_cluster_size={} clusters={}",
        min_cluster_size,
        n_clusters(&finest)
    );
    let mut layers = vec![finest];

    loop {
        if params.max_layers.is_some_and(|max| layers.len() >= max) {
            break;
        }
        let Some(previous) = layers.last() else {
            break;
        };
        if n_clusters(previous) < params.min_clusters {
            break;
        }

        let next = next_min_cluster_size(previous, min_cluster_size, params.next_cluster_size_quantile);
        if next > n {
            break;
        }
        min_cluster_size = next;

        let labels = hierarchy.labels_at(min_cluster_size);
        let found = n_clusters(&labels);
        if found < params.min_clusters {
            log::debug!(
                "stopping: min_cluster_size={} gives {} clusters (< {})",
                min_cluster_size,
                found,
                params.min_clusters
            );
            break;
        }
        if same_partition(&labels, previous) {
            log::debug!("skipping: min_cluster_size={} changes nothing", min_cluster_size);
            continue;
        }

        log::debug!(
            "layer {}: min_cluster_size={} clusters={}",
            layers.len(),
            min_cluster_size,
            found
        );
        layers.push(labels);
    }

    Ok(layers)
}
