// How history entries are measured: logical units or raw lines.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::graph::CallCommitGraph;
use crate::types::ChangeStats;

/// Measure used for every history entry of one aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryMode {
    /// Count word tokens of the changed lines.
    LogicalUnits,
    /// Count changed lines.
    Lines,
}

impl HistoryMode {
    /// Decide the mode for a whole graph, once, before any summing starts.
    ///
    /// The first node (in graph order) with a non-empty history decides: if
    /// its first entry carries logical units, units are used throughout;
    /// otherwise the whole computation falls back to lines. A graph with no
    /// history at all resolves to [`HistoryMode::LogicalUnits`].
    pub fn resolve(graph: &CallCommitGraph) -> Self {
        let first = graph
            .nodes()
            .find_map(|node| node.history.values().next());
        match first {
            Some(stats) if !stats.has_units() => {
                warn!("Logical units missing from history, falling back to line counts");
                Self::Lines
            }
            _ => Self::LogicalUnits,
        }
    }

    /// Churn of one entry under this mode. Entries without units count 0
    /// under [`HistoryMode::LogicalUnits`].
    pub fn churn(self, stats: &ChangeStats) -> u64 {
        match self {
            Self::LogicalUnits => stats.unit_churn().unwrap_or(0),
            Self::Lines => stats.line_churn(),
        }
    }
}
