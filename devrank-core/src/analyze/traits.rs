use crate::graph::CallCommitGraph;

/// Common interface for all analyzers.
pub trait Analyzer: Send + Sync {
    /// What the analysis produces.
    type Output;

    /// Human-readable name for this analyzer.
    fn name(&self) -> &'static str;

    /// Run the analysis over a fully built graph.
    fn analyze(&self, graph: &CallCommitGraph) -> crate::error::Result<Self::Output>;
}
