//! Containment tree validation and health checking.
//!
//! [`ClusterTree::health_check`] compares a tree with the layers it was built
//! from and reports:
//! - duplicate children and parents that are not coarser (critical)
//! - clusters of the layer stack missing from the tree (error)
//! - tree nodes that do not exist in their layer (error)
//! - children whose points are not all inside their parent (warning)
//!
//! Containment can legitimately fail on noisy data because parents are chosen
//! by majority, so it is only a warning.
//!
//! # Example
//!
//! ```rust
//! use stratum::build_cluster_tree;
//!
//! let layers = vec![vec![0, 0, 1, 1], vec![0, 0, 0, 0]];
//! let tree = build_cluster_tree(&layers).unwrap();
//! let report = tree.health_check(&layers);
//! assert!(report.is_healthy(), "{}", report);
//! ```

use std::collections::{BTreeSet, HashMap};

use super::tree::{ClusterRef, ClusterTree};
use crate::labels::{n_clusters, Label};

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Something unusual but not necessarily wrong.
    Warning,
    /// A problem that should be fixed.
    Error,
    /// The structure is not a tree.
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARN"),
            Severity::Error => write!(f, "ERROR"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// A single validation issue found during a health check.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Severity of the issue.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
    /// Cluster involved, if any.
    pub node: Option<ClusterRef>,
    /// Optional additional context.
    pub context: Option<String>,
}

impl ValidationIssue {
    /// Create a new validation issue.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            node: None,
            context: None,
        }
    }

    /// Attach the cluster involved.
    pub fn with_node(mut self, node: ClusterRef) -> Self {
        self.node = Some(node);
        self
    }

    /// Add context to this issue.
    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context = Some(ctx.into());
        self
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)?;
        if let Some(node) = self.node {
            write!(f, " (cluster {})", node)?;
        }
        if let Some(ctx) = &self.context {
            write!(f, " - {}", ctx)?;
        }
        Ok(())
    }
}

/// Issues found by a validation pass.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// All issues found.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Add an issue to the report.
    pub fn add(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Add a warning-level issue.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.add(ValidationIssue::new(Severity::Warning, message));
    }

    /// Add an error-level issue.
    pub fn error(&mut self, message: impl Into<String>) {
        self.add(ValidationIssue::new(Severity::Error, message));
    }

    /// No errors or critical issues.
    pub fn is_healthy(&self) -> bool {
        !self.issues.iter().any(|i| i.severity >= Severity::Error)
    }

    /// No issues at all.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Issues of a specific severity or higher.
    pub fn issues_at_level(&self, min_severity: Severity) -> Vec<&ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity >= min_severity)
            .collect()
    }

    /// Count issues by severity.
    pub fn counts(&self) -> HashMap<Severity, usize> {
        let mut counts = HashMap::new();
        for issue in &self.issues {
            *counts.entry(issue.severity).or_default() += 1;
        }
        counts
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_clean() {
            return write!(f, "Validation passed: no issues found");
        }

        let counts = self.counts();
        write!(f, "Validation report: ")?;

        let parts: Vec<String> = [
            (Severity::Critical, "critical"),
            (Severity::Error, "errors"),
            (Severity::Warning, "warnings"),
        ]
        .iter()
        .filter_map(|(sev, name)| counts.get(sev).map(|c| format!("{} {}", c, name)))
        .collect();

        writeln!(f, "{}", parts.join(", "))?;

        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }

        Ok(())
    }
}

/// Health report with tree statistics.
#[derive(Debug, Clone)]
pub struct HealthReport {
    /// Validation issues.
    pub validation: ValidationReport,
    /// Clusters in the layer stack.
    pub node_count: usize,
    /// Attached clusters with no children.
    pub leaf_count: usize,
    /// Largest number of edges between a cluster and the root.
    pub max_depth: usize,
    /// Children per parent, root included.
    pub avg_branching_factor: f64,
}

impl HealthReport {
    /// No errors or critical issues.
    pub fn is_healthy(&self) -> bool {
        self.validation.is_healthy()
    }
}

impl std::fmt::Display for HealthReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Cluster Tree Health Report")?;
        writeln!(f, "==========================")?;
        writeln!(f, "Clusters: {} ({} leaves)", self.node_count, self.leaf_count)?;
        writeln!(f, "Max depth: {}", self.max_depth)?;
        writeln!(f, "Avg branching factor: {:.2}", self.avg_branching_factor)?;
        writeln!(f)?;
        write!(f, "{}", self.validation)
    }
}

impl ClusterTree {
    /// Check this tree against the layers it was built from.
    pub fn health_check(&self, layers: &[Vec<Label>]) -> HealthReport {
        let mut validation = ValidationReport::new();

        if layers.len() != self.n_layers() {
            validation.error(format!(
                "tree spans {} layers but {} were given",
                self.n_layers(),
                layers.len()
            ));
        }

        let exists = |node: ClusterRef| -> bool {
            node.layer < layers.len() && node.cluster < n_clusters(&layers[node.layer])
        };

        let mut seen: BTreeSet<ClusterRef> = BTreeSet::new();
        for (parent, children) in self.iter() {
            if parent != self.root() && !exists(parent) {
                validation.add(
                    ValidationIssue::new(Severity::Error, "parent does not exist in its layer")
                        .with_node(parent),
                );
            }
            for &child in children {
                if !seen.insert(child) {
                    validation.add(
                        ValidationIssue::new(Severity::Critical, "child listed more than once")
                            .with_node(child),
                    );
                }
                if parent.layer <= child.layer {
                    validation.add(
                        ValidationIssue::new(Severity::Critical, "parent is not coarser than child")
                            .with_node(child)
                            .with_context(format!("parent {parent}")),
                    );
                }
                if !exists(child) {
                    validation.add(
                        ValidationIssue::new(Severity::Error, "child does not exist in its layer")
                            .with_node(child),
                    );
                    continue;
                }
                if parent == self.root() || !exists(parent) {
                    continue;
                }
                let outside = layers[child.layer]
                    .iter()
                    .zip(&layers[parent.layer])
                    .filter(|&(&c, &p)| c >= 0 && c as usize == child.cluster && p != parent.cluster as Label)
                    .count();
                if outside > 0 {
                    validation.add(
                        ValidationIssue::new(Severity::Warning, "child is not contained in parent")
                            .with_node(child)
                            .with_context(format!("{outside} points outside {parent}")),
                    );
                }
            }
        }

        let mut node_count = 0;
        let mut leaf_count = 0;
        let mut max_depth = 0;
        for (layer, labels) in layers.iter().enumerate() {
            for cluster in 0..n_clusters(labels) {
                let node = ClusterRef::new(layer, cluster);
                node_count += 1;
                match self.depth(node) {
                    Some(depth) => {
                        max_depth = max_depth.max(depth);
                        if self.children(node).is_empty() {
                            leaf_count += 1;
                        }
                    }
                    None => validation.add(
                        ValidationIssue::new(Severity::Error, "cluster missing from tree")
                            .with_node(node),
                    ),
                }
            }
        }

        let n_parents = self.iter().count();
        let avg_branching_factor = if n_parents == 0 {
            0.0
        } else {
            self.len() as f64 / n_parents as f64
        };

        HealthReport {
            validation,
            node_count,
            leaf_count,
            max_depth,
            avg_branching_factor,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, unused_results)]
mod tests {
    use super::*;
    use crate::hierarchy::tree::build_cluster_tree;
    use crate::labels::NOISE;

    fn r(layer: usize, cluster: usize) -> ClusterRef {
        ClusterRef::new(layer, cluster)
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::Critical);
    }

    #[test]
    fn test_validation_report_healthy() {
        let mut report = ValidationReport::new();
        report.warn("A warning");
        assert!(report.is_healthy());
        assert!(!report.is_clean());

        report.error("An error");
        assert!(!report.is_healthy());
        assert_eq!(report.issues_at_level(Severity::Error).len(), 1);
    }

    #[test]
    fn test_validation_issue_display() {
        let issue = ValidationIssue::new(Severity::Error, "Something wrong")
            .with_node(r(2, 7))
            .with_context("additional info");

        let s = format!("{}", issue);
        assert!(s.contains("ERROR"));
        assert!(s.contains("Something wrong"));
        assert!(s.contains("(2, 7)"));
        assert!(s.contains("additional info"));
    }

    #[test]
    fn test_built_tree_is_clean() {
        let layers = vec![
            vec![0, 0, 1, 1, 2, 2, NOISE, 3],
            vec![0, 0, 0, 0, 1, 1, NOISE, NOISE],
            vec![0, 0, 0, 0, 0, 0, NOISE, NOISE],
        ];
        let tree = build_cluster_tree(&layers).unwrap();
        let report = tree.health_check(&layers);

        assert!(report.validation.is_clean(), "{}", report);
        assert_eq!(report.node_count, 7);
        // (0,0) (0,1) (0,2) (0,3)
        assert_eq!(report.leaf_count, 4);
        assert_eq!(report.max_depth, 3);
        assert!(report.avg_branching_factor > 1.0);
    }

    #[test]
    fn test_majority_parent_warns_on_partial_containment() {
        let layers = vec![vec![0, 0, 0, 1], vec![1, 1, 0, 0]];
        let tree = build_cluster_tree(&layers).unwrap();
        let report = tree.health_check(&layers);

        assert!(report.is_healthy());
        let warnings = report.validation.issues_at_level(Severity::Warning);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].node, Some(r(0, 0)));
    }

    #[test]
    fn test_missing_cluster_is_an_error() {
        let layers = vec![vec![0, 1], vec![0, 0]];
        let mut tree = ClusterTree::new(2);
        tree.attach(r(1, 0), r(0, 0)).unwrap();
        tree.attach(r(2, 0), r(1, 0)).unwrap();

        let report = tree.health_check(&layers);
        assert!(!report.is_healthy());
        assert!(report
            .validation
            .issues
            .iter()
            .any(|i| i.message.contains("missing") && i.node == Some(r(0, 1))));
    }

    #[test]
    fn test_unknown_child_and_layer_count() {
        let layers = vec![vec![0, 0]];
        let mut tree = ClusterTree::new(2);
        tree.attach(r(2, 0), r(1, 4)).unwrap();
        tree.attach(r(2, 0), r(0, 0)).unwrap();

        let report = tree.health_check(&layers);
        assert!(!report.is_healthy());
        assert!(report
            .validation
            .issues
            .iter()
            .any(|i| i.message.contains("does not exist")));
        assert!(report.validation.issues.iter().any(|i| i.message.contains("layers")));
    }
}
