use thiserror::Error;

/// Result alias for `overlap`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by detection, evaluation and persistence primitives.
#[derive(Error, Debug)]
pub enum Error {
    /// Input was empty.
    #[error("empty input provided")]
    EmptyInput,

    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// Edge weight is negative or not finite.
    #[error("edge {edge} has invalid weight {weight}")]
    InvalidWeight {
        /// Edge index in the source graph.
        edge: usize,
        /// Offending weight.
        weight: f64,
    },

    /// A partition member is not a node of the graph.
    #[error("node {0} is not part of the graph")]
    UnknownNode(String),

    /// A disjoint-only computation received an overlapping partition.
    #[error("operation requires a disjoint partition")]
    OverlapNotSupported,

    /// A partition declared disjoint places a node in several communities.
    #[error("node {0} appears in more than one community of a disjoint partition")]
    OverlappingMembers(String),

    /// Worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),

    /// CSV encoding or decoding failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}
