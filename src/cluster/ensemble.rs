//! Ensemble (consensus) clustering by co-association voting.
//!
//! # Evidence Accumulation (Fred & Jain, 2005)
//!
//! Run many cheap, differently seeded partitions of the same data. Two points
//! that land in the same cluster in most runs very likely belong together; a
//! single unlucky split does not matter because it is outvoted.
//!
//! ```text
//! coassoc(i, j) = (# members with label_i == label_j) / n_members
//! ```
//!
//! Linking points whose co-association reaches a vote threshold `t` and
//! taking connected components gives one flat clustering per threshold. High
//! thresholds demand near-unanimous agreement (many small clusters); low
//! thresholds accept a simple majority (fewer, larger clusters). Connected
//! components at threshold `t` are exactly the single-linkage clusters of the
//! distance `1 - coassoc` cut at `1 - t`, so one dendrogram serves every
//! threshold.
//!
//! Components smaller than `min_cluster_size` are noise.
//!
//! ## References
//!
//! Fred & Jain (2005). "Combining Multiple Clusterings Using Evidence
//! Accumulation." IEEE TPAMI.

use super::kmeans::Kmeans;
use super::traits::{Clustering, EnsembleClustering};
use crate::error::{Error, Result};
use crate::hierarchy::dendrogram::condensed_distances;
use crate::hierarchy::Dendrogram;
use crate::labels::{relabel_contiguous, Label, NOISE};
use ndarray::ArrayView2;
use rand::prelude::*;

/// Co-association voting over seeded k-means members.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VotingEnsemble {
    /// Number of ensemble members.
    pub n_members: usize,
    /// Smallest k used by a member.
    pub min_k: usize,
    /// Largest k used by a member.
    pub max_k: usize,
    /// Vote fractions at which layers are cut, each in `(0, 1]`.
    pub vote_thresholds: Vec<f32>,
    /// Components smaller than this are noise.
    pub min_cluster_size: usize,
    /// Seed for the member seeds.
    pub seed: Option<u64>,
}

impl Default for VotingEnsemble {
    fn default() -> Self {
        Self {
            n_members: 16,
            min_k: 8,
            max_k: 24,
            vote_thresholds: vec![0.9, 0.75, 0.5],
            min_cluster_size: 10,
            seed: None,
        }
    }
}

impl VotingEnsemble {
    /// Create an ensemble with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of members.
    pub fn with_n_members(mut self, n_members: usize) -> Self {
        self.n_members = n_members;
        self
    }

    /// Set the range of k used by members (inclusive).
    pub fn with_k_range(mut self, min_k: usize, max_k: usize) -> Self {
        self.min_k = min_k;
        self.max_k = max_k;
        self
    }

    /// Set the vote thresholds, one layer per threshold.
    pub fn with_vote_thresholds(mut self, thresholds: Vec<f32>) -> Self {
        self.vote_thresholds = thresholds;
        self
    }

    /// Set the minimum component size.
    pub fn with_min_cluster_size(mut self, size: usize) -> Self {
        self.min_cluster_size = size;
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if self.n_members == 0 {
            return Err(Error::InvalidParameter {
                name: "n_members",
                message: "must be at least 1",
            });
        }
        if self.min_k < 2 || self.max_k < self.min_k {
            return Err(Error::InvalidParameter {
                name: "min_k",
                message: "need 2 <= min_k <= max_k",
            });
        }
        if self.vote_thresholds.is_empty()
            || self
                .vote_thresholds
                .iter()
                .any(|&t| !(t > 0.0 && t <= 1.0))
        {
            return Err(Error::InvalidParameter {
                name: "vote_thresholds",
                message: "need at least one threshold, each in (0, 1]",
            });
        }
        if self.min_cluster_size == 0 {
            return Err(Error::InvalidParameter {
                name: "min_cluster_size",
                message: "must be at least 1",
            });
        }
        Ok(())
    }

    /// Member partitions, one label vector per member.
    fn members(&self, data: ArrayView2<'_, f32>) -> Result<Vec<Vec<usize>>> {
        let n = data.nrows();
        let base_seed = match self.seed {
            Some(s) => s,
            None => rand::rng().random(),
        };
        let span = self.max_k - self.min_k + 1;

        (0..self.n_members)
            .map(|m| {
                let k = (self.min_k + m % span).min(n);
                Kmeans::new(k)
                    .with_seed(base_seed.wrapping_add(m as u64))
                    .fit_predict(data)
            })
            .collect()
    }

    /// Single-linkage dendrogram of the co-association distance
    /// `1 - votes / n_members`.
    fn coassociation_dendrogram(members: &[Vec<usize>], n: usize) -> Dendrogram {
        let mut condensed = condensed_distances(n, |a, b| {
            let votes = members.iter().filter(|m| m[a] == m[b]).count();
            vote_distance(votes, members.len())
        });
        Dendrogram::single_linkage(&mut condensed, n)
    }

    fn layer_at(&self, dendrogram: &Dendrogram, n_members: usize, min_votes: usize) -> Vec<Label> {
        let owner = dendrogram.components_within(vote_distance(min_votes, n_members));
        let mut sizes = vec![0usize; dendrogram.n_items() + dendrogram.n_merges()];
        for &o in &owner {
            sizes[o] += 1;
        }

        let mut labels: Vec<Label> = owner
            .iter()
            .map(|&o| {
                if sizes[o] >= self.min_cluster_size {
                    o as Label
                } else {
                    NOISE
                }
            })
            .collect();
        let _ = relabel_contiguous(&mut labels);
        labels
    }
}

/// Co-association distance for a vote count. Identical counts map to
/// identical distances, so cutting at `vote_distance(min_votes, ..)` keeps
/// exactly the pairs with at least `min_votes` votes.
fn vote_distance(votes: usize, n_members: usize) -> f64 {
    1.0 - votes as f64 / n_members as f64
}

impl EnsembleClustering for VotingEnsemble {
    fn cluster_layers(&self, data: ArrayView2<'_, f32>) -> Result<Vec<Vec<Label>>> {
        self.validate()?;
        let n = data.nrows();
        if n == 0 {
            return Err(Error::EmptyInput);
        }

        let members = self.members(data)?;
        let dendrogram = Self::coassociation_dendrogram(&members, n);
        log::debug!(
            "voting ensemble: {} members over {} points",
            members.len(),
            n
        );

        Ok(self
            .vote_thresholds
            .iter()
            .map(|&t| {
                let min_votes = (t * self.n_members as f32).ceil() as usize;
                self.layer_at(&dendrogram, members.len(), min_votes.max(1))
            })
            .collect())
    }
}
