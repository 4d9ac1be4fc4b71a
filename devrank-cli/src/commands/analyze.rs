use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use serde::Serialize;

use devrank_core::graph::CallCommitGraph;
use devrank_core::pipeline::AnalysisReport;
use devrank_core::score::commit_overall_scores;
use devrank_core::types::CommitId;

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Graph JSON written by `devrank replay` (`-` for stdin)
    pub graph: PathBuf,
    /// Output format
    #[arg(long, default_value = "json", value_parser = ["json", "text"])]
    pub format: String,
    /// Config file (default: .devrank.toml if present)
    #[arg(long, env = "DEVRANK_CONFIG")]
    pub config: Option<PathBuf>,
    /// JSON map of commit hexsha → label probabilities, for overall scores
    #[arg(long)]
    pub labels: Option<PathBuf>,
    /// Rows per ranking in text output
    #[arg(long, default_value_t = 10)]
    pub top: usize,
}

#[derive(Serialize)]
struct Output {
    #[serde(flatten)]
    report: AnalysisReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    overall_scores: Option<BTreeMap<CommitId, f64>>,
}

pub fn run(args: &AnalyzeArgs) -> anyhow::Result<()> {
    let config = super::load_config(args.config.as_deref())?;
    let graph = CallCommitGraph::from_json(&super::read_input(&args.graph)?)
        .with_context(|| format!("Cannot load graph {}", args.graph.display()))?;

    let report = AnalysisReport::compute(&graph, &config);
    let overall_scores = match &args.labels {
        Some(path) => {
            let labels: BTreeMap<CommitId, Vec<f64>> = super::read_json(path)?;
            Some(commit_overall_scores(
                &report.commit_devranks,
                &labels,
                &config.scoring.label_weights,
                config.scoring.top_one,
            )?)
        }
        None => None,
    };

    match args.format.as_str() {
        "text" => {
            print_text(&report, overall_scores.as_ref(), args.top);
            Ok(())
        }
        _ => super::print_json(&Output {
            report,
            overall_scores,
        }),
    }
}

fn print_text(report: &AnalysisReport, overall: Option<&BTreeMap<CommitId, f64>>, top: usize) {
    println!(
        "Graph: {} functions, {} calls, {} commits ({:?})",
        report.nodes, report.edges, report.commits, report.history_mode
    );
    println!("Complexity: {:.2}", report.complexity);

    print_ranking("Centrality", &report.centrality, top);
    print_ranking("Function DevRank", &report.function_devranks, top);
    print_ranking("Commit DevRank", &report.commit_devranks, top);
    print_ranking("Developer DevRank", &report.developer_devranks, top);
    if let Some(scores) = overall {
        print_ranking("Overall commit score", scores, top);
    }
}

fn print_ranking<K: Clone + std::fmt::Display>(title: &str, scores: &BTreeMap<K, f64>, top: usize) {
    println!();
    println!("{title}:");
    for (key, score) in AnalysisReport::top(scores, top) {
        println!("  {score:>8.4}  {key}");
    }
}
