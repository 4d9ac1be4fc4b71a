use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use devrank_diff::{FileDiff, parse_patch};

#[derive(Args, Debug)]
pub struct InvertArgs {
    /// Diff as JSON (`{"additions": [...], "deletions": [...]}`), or a patch
    /// with `--patch`; `-` for stdin
    pub input: PathBuf,
    /// Read the input as a unified diff instead of JSON
    #[arg(long)]
    pub patch: bool,
}

pub fn run(args: &InvertArgs) -> anyhow::Result<()> {
    let diff: FileDiff = if args.patch {
        parse_patch(&super::read_input(&args.input)?)
    } else {
        super::read_json(&args.input)?
    };
    diff.validate()
        .with_context(|| format!("Diff error in {}", args.input.display()))?;
    super::print_json(&diff.inverse())
}
