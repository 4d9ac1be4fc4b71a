// Whole-project complexity from the call-commit graph.
//
// Churn sums are converted to f64 (precision loss acceptable for metrics).
#![allow(clippy::cast_precision_loss)]

use tracing::info;

use crate::graph::CallCommitGraph;
use crate::history::HistoryMode;
use crate::types::Blacklist;

use super::traits::Analyzer;

/// `Σ churn + r_n·|nodes| + r_e·|edges|`, skipping blacklisted commits.
#[derive(Debug, Clone, Default)]
pub struct ComplexityAnalyzer {
    /// Logical units per node.
    pub r_n: f64,
    /// Logical units per edge.
    pub r_e: f64,
    pub blacklist: Blacklist,
}

impl ComplexityAnalyzer {
    pub fn new(r_n: f64, r_e: f64) -> Self {
        Self {
            r_n,
            r_e,
            blacklist: Blacklist::new(),
        }
    }

    #[must_use]
    pub fn with_blacklist(mut self, blacklist: Blacklist) -> Self {
        self.blacklist = blacklist;
        self
    }

    pub fn evaluate(&self, graph: &CallCommitGraph) -> f64 {
        self.evaluate_with(graph, HistoryMode::resolve(graph))
    }

    /// Like [`evaluate`](Self::evaluate) with an already resolved history mode.
    pub fn evaluate_with(&self, graph: &CallCommitGraph, mode: HistoryMode) -> f64 {
        let churn: u64 = graph
            .nodes()
            .flat_map(|node| node.history.iter())
            .filter(|(commit, _)| !self.blacklist.contains(*commit))
            .map(|(_, stats)| mode.churn(stats))
            .sum();

        let complexity = churn as f64
            + self.r_n * graph.node_count() as f64
            + self.r_e * graph.edge_count() as f64;
        info!(
            ?mode,
            churn,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            complexity,
            "Evaluated project complexity"
        );
        complexity
    }
}

impl Analyzer for ComplexityAnalyzer {
    type Output = f64;

    fn name(&self) -> &'static str {
        "complexity"
    }

    fn analyze(&self, graph: &CallCommitGraph) -> crate::error::Result<f64> {
        Ok(self.evaluate(graph))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChangeStats, CommitId, CommitInfo};

    fn two_node_graph(units: bool) -> CallCommitGraph {
        let stats = |adds, dels| {
            if units {
                ChangeStats::with_units(adds, dels, adds * 10, dels * 10)
            } else {
                ChangeStats::lines(adds, dels)
            }
        };
        let mut g = CallCommitGraph::new();
        g.add_commit(CommitInfo::new("c1", "a", "a@x", "first"));
        g.add_node("f", ["m.c"]);
        g.add_node("g", ["m.c"]);
        g.update_node_history("f", &stats(3, 1)).unwrap();
        g.update_node_history("g", &stats(2, 0)).unwrap();
        g.add_edge("f", "g").unwrap();
        g.add_commit(CommitInfo::new("c2", "b", "b@x", "second"));
        g.update_node_history("g", &stats(5, 5)).unwrap();
        g
    }

    #[test]
    fn sums_churn_and_structure() {
        let g = two_node_graph(false);
        let c = ComplexityAnalyzer::new(1.5, 0.5).evaluate(&g);
        assert!((c - (16.0 + 1.5 * 2.0 + 0.5)).abs() < f64::EPSILON);
    }

    #[test]
    fn blacklisted_commits_are_excluded() {
        let g = two_node_graph(false);
        let blacklist: Blacklist = [CommitId::from("c2")].into_iter().collect();
        let c = ComplexityAnalyzer::new(1.5, 0.5)
            .with_blacklist(blacklist)
            .evaluate(&g);
        assert!((c - (6.0 + 3.0 + 0.5)).abs() < f64::EPSILON);
    }

    #[test]
    fn logical_units_are_preferred() {
        let g = two_node_graph(true);
        let c = ComplexityAnalyzer::default().analyze(&g).unwrap();
        assert!((c - 160.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_graph_is_zero() {
        let c = ComplexityAnalyzer::new(2.0, 3.0).evaluate(&CallCommitGraph::new());
        assert!(c.abs() < f64::EPSILON);
    }
}
