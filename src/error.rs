use thiserror::Error;

/// Errors returned by the clustering and layout pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// Input slice is empty.
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

    /// A feature name that is not one of the canonical features.
    #[error("unknown feature: {0}")]
    UnknownFeature(String),

    /// Reading a catalogue from disk failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The catalogue document could not be parsed.
    #[error("catalogue parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Settings could not be loaded.
    #[error("config error: {0}")]
    Config(#[from] ::config::ConfigError),

    /// Fetching the catalogue over HTTP failed.
    #[cfg(feature = "fetch")]
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;
