// DevRank: centrality weighted by development effort, and its breakdown onto
// commits and developers.
//
// Dev-eq counts are converted to f64 (precision loss acceptable for metrics).
#![allow(clippy::cast_precision_loss)]

use std::collections::BTreeMap;

use petgraph::graph::DiGraph;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::graph::{CallCommitGraph, commits_dev_eq_of, node_dev_eq_of};
use crate::types::{Blacklist, CommitId};

use super::centrality::{CentralityConfig, TransitionMatrix, power_iterate};
use super::traits::Analyzer;

/// Weighted rank of every node of `graph`, indexed like its nodes.
///
/// A step from `u` goes to `v` with probability `w(v) / Σ w(out(u))`, and the
/// teleport distribution is `w / Σ w`. All-zero weights teleport uniformly.
pub fn devrank_scores<N, E>(
    graph: &DiGraph<N, E>,
    weights: &[f64],
    config: &CentralityConfig,
) -> Vec<f64> {
    let n = graph.node_count();
    if n == 0 {
        return vec![];
    }
    let universe: f64 = weights.iter().sum();
    let teleport: Vec<f64> = if universe > 0.0 {
        weights.iter().map(|w| w / universe).collect()
    } else {
        vec![1.0 / n as f64; n]
    };

    let matrix = TransitionMatrix::from_graph(graph, weights);
    let (scores, outcome) = power_iterate(&matrix, &teleport, config);
    debug!(
        nodes = n,
        iterations = outcome.iterations,
        converged = outcome.converged,
        "DevRank finished"
    );
    scores
}

/// DevRank of every function, weighted by its dev-eq (at least 1).
pub fn function_devranks(
    graph: &CallCommitGraph,
    config: &CentralityConfig,
    blacklist: &Blacklist,
) -> BTreeMap<String, f64> {
    let weights: Vec<f64> = graph
        .nodes()
        .map(|node| node_dev_eq_of(node, blacklist) as f64)
        .collect();
    let scores = devrank_scores(graph.digraph(), &weights, config);
    graph
        .nodes()
        .zip(scores)
        .map(|(node, score)| (node.name.clone(), score))
        .collect()
}

/// Share of each function's DevRank earned by each commit:
/// `dr(c, f) = dr(f) · dev_eq(f, c) / dev_eq(f)`.
///
/// Every registered commit is present, with an empty map if it touched no
/// function.
pub fn commit_function_devranks(
    graph: &CallCommitGraph,
    config: &CentralityConfig,
    blacklist: &Blacklist,
) -> BTreeMap<CommitId, BTreeMap<String, f64>> {
    let functions = function_devranks(graph, config, blacklist);
    split_by_commit(graph, &functions, blacklist)
}

fn split_by_commit(
    graph: &CallCommitGraph,
    functions: &BTreeMap<String, f64>,
    blacklist: &Blacklist,
) -> BTreeMap<CommitId, BTreeMap<String, f64>> {
    let mut split: BTreeMap<CommitId, BTreeMap<String, f64>> = graph
        .commits()
        .iter()
        .map(|c| (c.hexsha.clone(), BTreeMap::new()))
        .collect();

    for node in graph.nodes() {
        let per_commit = commits_dev_eq_of(node, blacklist);
        if per_commit.is_empty() {
            continue;
        }
        let total = node_dev_eq_of(node, blacklist) as f64;
        let rank = functions.get(&node.name).copied().unwrap_or(0.0);
        for (commit, dev_eq) in per_commit {
            split
                .entry(commit)
                .or_default()
                .insert(node.name.clone(), rank * dev_eq as f64 / total);
        }
    }
    split
}

/// `dr(c) = Σ_f dr(c, f)`; every registered commit is present.
pub fn commit_devranks(
    graph: &CallCommitGraph,
    config: &CentralityConfig,
    blacklist: &Blacklist,
) -> BTreeMap<CommitId, f64> {
    sum_commits(&commit_function_devranks(graph, config, blacklist))
}

fn sum_commits(split: &BTreeMap<CommitId, BTreeMap<String, f64>>) -> BTreeMap<CommitId, f64> {
    split
        .iter()
        .map(|(commit, functions)| (commit.clone(), functions.values().sum()))
        .collect()
}

/// DevRank of each author e-mail: the sum over their commits.
pub fn developer_devranks(
    graph: &CallCommitGraph,
    config: &CentralityConfig,
    blacklist: &Blacklist,
) -> BTreeMap<String, f64> {
    sum_developers(graph, &commit_devranks(graph, config, blacklist))
}

fn sum_developers(graph: &CallCommitGraph, commits: &BTreeMap<CommitId, f64>) -> BTreeMap<String, f64> {
    let mut developers: BTreeMap<String, f64> = BTreeMap::new();
    for info in graph.commits() {
        if let Some(rank) = commits.get(&info.hexsha) {
            *developers.entry(info.author_email.clone()).or_insert(0.0) += rank;
        }
    }
    developers
}

// ── Report ─────────────────────────────────────────────────────────

/// All DevRank views of one graph, computed from a single rank run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DevRankReport {
    pub functions: BTreeMap<String, f64>,
    pub commit_functions: BTreeMap<CommitId, BTreeMap<String, f64>>,
    pub commits: BTreeMap<CommitId, f64>,
    pub developers: BTreeMap<String, f64>,
}

impl DevRankReport {
    pub fn compute(graph: &CallCommitGraph, config: &CentralityConfig, blacklist: &Blacklist) -> Self {
        let functions = function_devranks(graph, config, blacklist);
        let commit_functions = split_by_commit(graph, &functions, blacklist);
        let commits = sum_commits(&commit_functions);
        let developers = sum_developers(graph, &commits);
        info!(
            functions = functions.len(),
            commits = commits.len(),
            developers = developers.len(),
            "Computed DevRank"
        );
        Self {
            functions,
            commit_functions,
            commits,
            developers,
        }
    }
}

/// Runs [`DevRankReport::compute`] as an [`Analyzer`].
#[derive(Debug, Clone, Default)]
pub struct DevRankAnalyzer {
    pub config: CentralityConfig,
    pub blacklist: Blacklist,
}

impl Analyzer for DevRankAnalyzer {
    type Output = DevRankReport;

    fn name(&self) -> &'static str {
        "devrank"
    }

    fn analyze(&self, graph: &CallCommitGraph) -> crate::error::Result<DevRankReport> {
        Ok(DevRankReport::compute(graph, &self.config, &self.blacklist))
    }
}

// ── Tests ──────────────────────────────────────────────────────────
