// Centrality: PageRank-style power iteration over a sparse transition matrix.
//
// Graph algorithms intentionally cast int↔float (precision loss acceptable for metrics).
#![allow(clippy::cast_precision_loss)]

use std::collections::BTreeMap;

use petgraph::Direction;
use petgraph::graph::DiGraph;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graph::CallCommitGraph;

use super::traits::Analyzer;

// ── Configuration ──────────────────────────────────────────────────

/// Convergence controls shared by `PageRank` and `DevRank`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CentralityConfig {
    /// Damping factor.
    pub alpha: f64,
    /// Stop once the L1 change between iterations drops below this.
    pub epsilon: f64,
    pub max_iters: u32,
}

impl Default for CentralityConfig {
    fn default() -> Self {
        Self {
            alpha: 0.85,
            epsilon: 1e-5,
            max_iters: 300,
        }
    }
}

// ── Sparse transition matrix ───────────────────────────────────────

/// Column-stochastic transition matrix in compressed sparse row form.
///
/// Entry `(v, u)` is the probability of stepping from `u` to `v`. Columns of
/// nodes without out-edges are all zero.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionMatrix {
    size: usize,
    row_offsets: Vec<usize>,
    columns: Vec<usize>,
    values: Vec<f64>,
}

impl TransitionMatrix {
    /// Build from a graph; an edge `u → v` gets `weights[v] / Σ weights[out(u)]`.
    ///
    /// Uniform weights give the classic `1 / out_degree(u)`. Outgoing sets
    /// whose weights sum to zero contribute nothing.
    pub fn from_graph<N, E>(graph: &DiGraph<N, E>, weights: &[f64]) -> Self {
        let size = graph.node_count();
        let mut triplets: Vec<(usize, usize, f64)> = Vec::with_capacity(graph.edge_count());

        for u in graph.node_indices() {
            let targets: Vec<usize> = graph
                .neighbors_directed(u, Direction::Outgoing)
                .map(|v| v.index())
                .collect();
            let total: f64 = targets.iter().map(|&v| weights[v]).sum();
            if total <= 0.0 {
                continue;
            }
            for v in targets {
                triplets.push((v, u.index(), weights[v] / total));
            }
        }

        Self::from_triplets(size, triplets)
    }

    fn from_triplets(size: usize, mut triplets: Vec<(usize, usize, f64)>) -> Self {
        triplets.sort_by_key(|&(row, col, _)| (row, col));

        let mut row_offsets = vec![0_usize; size + 1];
        for &(row, _, _) in &triplets {
            row_offsets[row + 1] += 1;
        }
        for i in 0..size {
            row_offsets[i + 1] += row_offsets[i];
        }

        let (columns, values) = triplets.into_iter().map(|(_, col, val)| (col, val)).unzip();
        Self {
            size,
            row_offsets,
            columns,
            values,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Stored non-zero entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// `factor · M · v`.
    pub fn scaled_product(&self, v: &[f64], factor: f64) -> Vec<f64> {
        (0..self.size)
            .map(|row| {
                let span = self.row_offsets[row]..self.row_offsets[row + 1];
                let dot: f64 = self.columns[span.clone()]
                    .iter()
                    .zip(&self.values[span])
                    .map(|(&col, &val)| val * v[col])
                    .sum();
                factor * dot
            })
            .collect()
    }
}

// ── Power iteration ────────────────────────────────────────────────

/// How a power iteration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Convergence {
    pub iterations: u32,
    pub converged: bool,
}

/// Run `new_v = α·P·v + γ·teleport` from a uniform start, where
/// `γ = ‖v‖₁ − ‖α·P·v‖₁` puts back the mass lost to damping and dangling
/// nodes.
///
/// Stops when `‖new_v − v‖₁ < ε` or after `max_iters` rounds; hitting the
/// cap is not an error and yields the last vector.
pub fn power_iterate(
    matrix: &TransitionMatrix,
    teleport: &[f64],
    config: &CentralityConfig,
) -> (Vec<f64>, Convergence) {
    let n = matrix.size();
    let mut outcome = Convergence {
        iterations: 0,
        converged: false,
    };
    if n == 0 {
        outcome.converged = true;
        return (vec![], outcome);
    }

    let mut v = vec![1.0 / n as f64; n];
    for _ in 0..config.max_iters {
        let mut next = matrix.scaled_product(&v, config.alpha);
        let gamma = l1_norm(&v) - l1_norm(&next);
        for (x, p) in next.iter_mut().zip(teleport) {
            *x += gamma * p;
        }
        let delta: f64 = next.iter().zip(&v).map(|(a, b)| (a - b).abs()).sum();

        v = next;
        outcome.iterations += 1;
        if delta < config.epsilon {
            outcome.converged = true;
            break;
        }
    }

    (v, outcome)
}

fn l1_norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x.abs()).sum()
}

/// Unweighted `PageRank` of any petgraph digraph, indexed like its nodes.
pub fn pagerank_scores<N, E>(graph: &DiGraph<N, E>, config: &CentralityConfig) -> Vec<f64> {
    let n = graph.node_count();
    if n == 0 {
        return vec![];
    }
    let matrix = TransitionMatrix::from_graph(graph, &vec![1.0; n]);
    let teleport = vec![1.0 / n as f64; n];
    let (scores, outcome) = power_iterate(&matrix, &teleport, config);
    debug!(
        nodes = n,
        nnz = matrix.nnz(),
        iterations = outcome.iterations,
        converged = outcome.converged,
        "PageRank finished"
    );
    scores
}

/// `PageRank` of every function in the call graph.
pub fn pagerank(graph: &CallCommitGraph, config: &CentralityConfig) -> BTreeMap<String, f64> {
    let scores = pagerank_scores(graph.digraph(), config);
    graph
        .nodes()
        .zip(scores)
        .map(|(node, score)| (node.name.clone(), score))
        .collect()
}

// ── Analyzer ───────────────────────────────────────────────────────

/// Structural importance of each function, ignoring history.
#[derive(Debug, Clone, Default)]
pub struct CentralityAnalyzer {
    pub config: CentralityConfig,
}

impl Analyzer for CentralityAnalyzer {
    type Output = BTreeMap<String, f64>;

    fn name(&self) -> &'static str {
        "centrality"
    }

    fn analyze(&self, graph: &CallCommitGraph) -> crate::error::Result<Self::Output> {
        Ok(pagerank(graph, &self.config))
    }
}

// ── Tests ──────────────────────────────────────────────────────────
