use thiserror::Error;

/// Result alias for `stratum`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by layering, tree-building and clustering primitives.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Input was empty.
    #[error("empty input provided")]
    EmptyInput,

    /// Point counts disagree between coordinates, embeddings or label vectors.
    #[error("shape mismatch: expected {expected}, actual {actual}")]
    ShapeMismatch {
        /// Expected shape description.
        expected: String,
        /// Actual shape description.
        actual: String,
    },

    /// A label vector holds a value below the noise marker.
    #[error("invalid label {label} at point {index}")]
    InvalidLabel {
        /// Point index.
        index: usize,
        /// Offending label.
        label: i32,
    },

    /// Invalid number of clusters requested.
    #[error("cannot create {requested} clusters from {n_items} items")]
    InvalidClusterCount {
        /// Requested count.
        requested: usize,
        /// Number of items.
        n_items: usize,
    },

    /// Fewer clusters than required at the finest resolution.
    ///
    /// Strategies recover from this locally by emitting a single degenerate layer.
    #[error("degenerate clustering: found {found} clusters, at least {required} required")]
    DegenerateClustering {
        /// Clusters found in the finest layer.
        found: usize,
        /// Configured minimum.
        required: usize,
    },

    /// Internal containment-tree invariant violated.
    #[error("tree inconsistency: {0}")]
    TreeInconsistency(String),

    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },
}

impl Error {
    pub(crate) fn shape(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Error::ShapeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}
