pub mod analyze;
pub mod attribute;
pub mod hunks;
pub mod invert;
pub mod parse;
pub mod replay;

use std::io::Read;
use std::path::Path;

use anyhow::Context;
use clap::Subcommand;
use serde::Serialize;
use serde::de::DeserializeOwned;

use devrank_core::config::{CONFIG_FILE_NAME, DevRankConfig};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the old-file line interval of every hunk header in a patch
    Hunks(hunks::HunksArgs),
    /// Parse a single-file patch into additions and deletions
    Parse(parse::ParseArgs),
    /// Invert a per-file diff into new-file coordinates
    Invert(invert::InvertArgs),
    /// Attribute a patch's changed lines to the functions they touch
    Attribute(attribute::AttributeArgs),
    /// Replay a commit history into a call-commit graph
    Replay(replay::ReplayArgs),
    /// Compute complexity, centrality and DevRank of a graph
    Analyze(analyze::AnalyzeArgs),
}

pub async fn run(cmd: Command) -> anyhow::Result<()> {
    match cmd {
        Command::Hunks(args) => hunks::run(&args),
        Command::Parse(args) => parse::run(&args),
        Command::Invert(args) => invert::run(&args),
        Command::Attribute(args) => attribute::run(&args),
        Command::Replay(args) => replay::run(args).await,
        Command::Analyze(args) => analyze::run(&args),
    }
}

// ── Shared helpers ────────────────────────────────────────────────

/// Read a whole input file; `-` reads stdin.
pub(crate) fn read_input(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Cannot read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = read_input(path)?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// An explicit `--config`, else `.devrank.toml` in the working directory if
/// present, else defaults.
pub(crate) fn load_config(explicit: Option<&Path>) -> anyhow::Result<DevRankConfig> {
    let path = match explicit {
        Some(path) => path,
        None if Path::new(CONFIG_FILE_NAME).exists() => Path::new(CONFIG_FILE_NAME),
        None => return Ok(DevRankConfig::default()),
    };
    DevRankConfig::load(path).with_context(|| format!("Cannot load config {}", path.display()))
}
