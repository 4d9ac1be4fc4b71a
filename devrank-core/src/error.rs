use crate::types::CommitId;

/// Top-level devrank error type.
///
/// All fallible operations in `devrank-core` return [`Result<T, DevRankError>`](Result).
/// Each variant wraps a layer-specific error enum so callers can match on the
/// source without losing type information.
#[derive(thiserror::Error, Debug)]
pub enum DevRankError {
    /// Diff input violated an ordering precondition.
    #[error("Diff error: {0}")]
    Diff(#[from] devrank_diff::DiffError),

    /// Call-commit graph operation failed.
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Error during analysis (complexity, centrality, scoring).
    #[error("Analysis error: {0}")]
    Analyze(#[from] AnalyzeError),

    /// Error in configuration parsing or validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// JSON (de)serialization of graphs, histories or reports failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the call-commit graph.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A referenced function node was never added.
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    /// History was recorded before any commit was registered.
    #[error("No current commit: call add_commit before recording history")]
    NoCurrentCommit,

    /// A serialized graph refers to a commit it does not list.
    #[error("Unknown commit: {0}")]
    UnknownCommit(CommitId),
}

/// Errors during analysis.
#[derive(thiserror::Error, Debug)]
pub enum AnalyzeError {
    /// A commit being scored has no label probabilities.
    #[error("Commit {0} has no label probabilities")]
    MissingLabels(CommitId),

    /// Label probabilities and label weights disagree in length.
    #[error("Commit {commit} has {found} label probabilities, expected {expected}")]
    LabelArity {
        commit: CommitId,
        expected: usize,
        found: usize,
    },
}

/// Errors in configuration parsing and validation.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist at the expected path.
    #[error("Config file not found: {0}")]
    NotFound(String),

    /// Configuration values are present but semantically invalid.
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// Configuration file syntax could not be parsed (TOML error).
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Convenience alias for `Result<T, DevRankError>`.
pub type Result<T> = std::result::Result<T, DevRankError>;
