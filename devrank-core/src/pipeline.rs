// History replay and whole-graph analysis report.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::analyze::{CentralityConfig, ComplexityAnalyzer, DevRankReport, pagerank};
use crate::config::DevRankConfig;
use crate::graph::CallCommitGraph;
use crate::history::HistoryMode;
use crate::server::{CommitRef, GraphServer, SeekingMode};
use crate::types::CommitId;

// ── Replay ─────────────────────────────────────────────────────────

/// Totals of one [`replay_history`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayStats {
    pub commits: usize,
    pub forward: usize,
    pub merges: usize,
    pub rewinds: usize,
    pub files_applied: usize,
    pub files_skipped: usize,
    pub functions_touched: usize,
    pub edges_added: usize,
    #[serde(skip)]
    pub duration: Duration,
}

/// Feed `commits` to `server` in order.
///
/// Stops at the first failing commit; earlier commits stay applied.
pub async fn replay_history<S>(server: &mut S, commits: &[CommitRef]) -> crate::error::Result<ReplayStats>
where
    S: GraphServer + ?Sized,
{
    let start = Instant::now();
    let mut stats = ReplayStats::default();
    let total = commits.len();

    for (i, commit) in commits.iter().enumerate() {
        let update = server.update_graph(commit).await?;
        stats.commits += 1;
        match commit.seeking_mode {
            SeekingMode::NormalForward => stats.forward += 1,
            SeekingMode::MergeCommit => stats.merges += 1,
            SeekingMode::Rewind => stats.rewinds += 1,
        }
        stats.files_applied += update.files_applied;
        stats.files_skipped += update.files_skipped;
        stats.functions_touched += update.functions_touched;
        stats.edges_added += update.edges_added;

        debug!(
            progress = format_args!("{}/{total}", i + 1),
            commit = %commit.info.hexsha,
            "Replayed commit"
        );
    }

    stats.duration = start.elapsed();
    info!(
        commits = stats.commits,
        merges = stats.merges,
        rewinds = stats.rewinds,
        files = stats.files_applied,
        skipped = stats.files_skipped,
        elapsed = ?stats.duration,
        "History replay complete"
    );
    Ok(stats)
}

// ── Report ─────────────────────────────────────────────────────────

/// Every metric of one graph, as produced by `devrank analyze`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub computed_at: DateTime<Utc>,
    pub nodes: usize,
    pub edges: usize,
    pub commits: usize,
    pub history_mode: HistoryMode,
    pub complexity: f64,
    pub centrality: BTreeMap<String, f64>,
    pub function_devranks: BTreeMap<String, f64>,
    pub commit_devranks: BTreeMap<CommitId, f64>,
    pub developer_devranks: BTreeMap<String, f64>,
}

impl AnalysisReport {
    pub fn compute(graph: &CallCommitGraph, config: &DevRankConfig) -> Self {
        let blacklist = config.history.blacklist_set();
        let centrality_config: &CentralityConfig = &config.centrality;

        let history_mode = HistoryMode::resolve(graph);
        let complexity = ComplexityAnalyzer::new(config.complexity.r_n, config.complexity.r_e)
            .with_blacklist(blacklist.clone())
            .evaluate_with(graph, history_mode);
        let centrality = pagerank(graph, centrality_config);
        let devrank = DevRankReport::compute(graph, centrality_config, &blacklist);

        Self {
            computed_at: Utc::now(),
            nodes: graph.node_count(),
            edges: graph.edge_count(),
            commits: graph.commits().len(),
            history_mode,
            complexity,
            centrality,
            function_devranks: devrank.functions,
            commit_devranks: devrank.commits,
            developer_devranks: devrank.developers,
        }
    }

    /// The `limit` highest entries of a score map, best first.
    pub fn top<K: Clone>(scores: &BTreeMap<K, f64>, limit: usize) -> Vec<(K, f64)> {
        let mut ranked: Vec<(K, f64)> = scores.iter().map(|(k, v)| (k.clone(), *v)).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(limit);
        ranked
    }
}
