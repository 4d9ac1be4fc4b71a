// Benchmark PageRank and DevRank at varying call-graph sizes.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use devrank_core::analyze::centrality::{CentralityConfig, pagerank};
use devrank_core::analyze::devrank::function_devranks;
use devrank_core::graph::CallCommitGraph;
use devrank_core::types::{Blacklist, ChangeStats, CommitInfo};

/// Build a synthetic call-commit graph.
///
/// Structure: `node_count` functions, ~`edge_factor` calls per function.
/// Edges connect node `i` to `(i * prime + 1) % node_count` for several primes,
/// and every function gets one history entry from one of a few commits.
fn build_synthetic_graph(node_count: usize, edge_factor: usize) -> CallCommitGraph {
    let mut graph = CallCommitGraph::new();
    let names: Vec<String> = (0..node_count).map(|i| format!("fn_{i}")).collect();

    for c in 0..8 {
        graph.add_commit(CommitInfo::new(
            format!("{c:040x}"),
            "bench",
            format!("dev{}@example.org", c % 3),
            "synthetic",
        ));
        for (i, name) in names.iter().enumerate().filter(|(i, _)| i % 8 == c) {
            graph.add_node(name, ["src/lib.c"]);
            graph
                .update_node_history(name, &ChangeStats::lines((i % 17) as u64 + 1, (i % 5) as u64))
                .ok();
        }
    }

    let primes = [7, 13, 31, 61, 127, 251];
    for &prime in &primes[..edge_factor.min(primes.len())] {
        for i in 0..node_count {
            let target = (i.wrapping_mul(prime).wrapping_add(1)) % node_count;
            if target != i {
                graph.add_edge(&names[i], &names[target]).ok();
            }
        }
    }

    graph
}

fn bench_pagerank(c: &mut Criterion) {
    let mut group = c.benchmark_group("pagerank");
    let config = CentralityConfig::default();

    for node_count in [1_000, 10_000, 100_000] {
        let graph = build_synthetic_graph(node_count, 3);

        group.bench_with_input(BenchmarkId::new("nodes", node_count), &graph, |b, g| {
            b.iter(|| pagerank(g, &config));
        });
    }

    group.finish();
}

fn bench_devrank(c: &mut Criterion) {
    let mut group = c.benchmark_group("devrank");
    let config = CentralityConfig::default();
    let blacklist = Blacklist::new();

    for node_count in [1_000, 10_000] {
        let graph = build_synthetic_graph(node_count, 3);

        group.bench_with_input(BenchmarkId::new("nodes", node_count), &graph, |b, g| {
            b.iter(|| function_devranks(g, &config, &blacklist));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_pagerank, bench_devrank);
criterion_main!(benches);
