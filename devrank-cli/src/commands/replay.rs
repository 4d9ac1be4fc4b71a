use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracing::info;

use devrank_core::graph::CallCommitGraph;
use devrank_core::pipeline::replay_history;
use devrank_core::server::{CommitRef, FileFilter, PatchGraphServer};

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// JSON list of commits, oldest first (`-` for stdin)
    pub history: PathBuf,
    /// Write the resulting graph here (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Continue from a previously saved graph
    #[arg(long)]
    pub graph: Option<PathBuf>,
    /// Config file (default: .devrank.toml if present)
    #[arg(long, env = "DEVRANK_CONFIG")]
    pub config: Option<PathBuf>,
    /// Ignore the configured file filter
    #[arg(long)]
    pub all_files: bool,
}

pub async fn run(args: ReplayArgs) -> anyhow::Result<()> {
    let config = super::load_config(args.config.as_deref())?;
    let commits: Vec<CommitRef> = super::read_json(&args.history)?;

    let filter = if args.all_files {
        FileFilter::accept_all()
    } else {
        FileFilter::from_section(&config.filter).context("Invalid config filter")?
    };
    let graph = match &args.graph {
        Some(path) => CallCommitGraph::from_json(&super::read_input(path)?)
            .with_context(|| format!("Cannot load graph {}", path.display()))?,
        None => CallCommitGraph::new(),
    };

    let mut server = PatchGraphServer::with_graph(graph, filter);
    let stats = replay_history(&mut server, &commits).await?;
    let graph = server.into_graph();
    let json = graph.to_json()?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Cannot write {}", path.display()))?;
            info!(path = %path.display(), "Wrote graph");
            eprintln!(
                "Replayed {} commits ({} files, {} skipped) into {} functions, {} calls",
                stats.commits,
                stats.files_applied,
                stats.files_skipped,
                graph.node_count(),
                graph.edge_count()
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}
