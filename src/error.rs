use thiserror::Error;

/// Errors returned by the k-means engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Input has no observations.
    #[error("empty input")]
    EmptyInput,

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: &'static str,
    },

    /// Requested cluster count is incompatible with the dataset.
    #[error("invalid cluster count: requested {requested}, but dataset has {n_items} items")]
    InvalidClusterCount {
        /// Requested number of clusters.
        requested: usize,
        /// Number of items in the dataset.
        n_items: usize,
    },

    /// Points in a dataset have inconsistent dimensionality.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected dimensionality.
        expected: usize,
        /// Found dimensionality.
        found: usize,
    },

    /// A cluster lost all of its members and the policy forbids recovering.
    #[error("cluster {cluster} has no members at iteration {iteration}")]
    EmptyCluster {
        /// Index of the empty cluster.
        cluster: usize,
        /// Iteration (1-based) during which the cluster emptied.
        iteration: usize,
    },

    /// The iteration cap was reached before the centroids settled.
    #[error("did not converge within {max_iter} iterations")]
    NonConvergence {
        /// The configured cap.
        max_iter: usize,
    },
}

impl Error {
    /// Whether this error was caused by the inputs or parameters rather than by the
    /// fit itself. Configuration errors are raised before any iteration runs.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::EmptyInput
                | Error::InvalidParameter { .. }
                | Error::InvalidClusterCount { .. }
                | Error::DimensionMismatch { .. }
        )
    }
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;
