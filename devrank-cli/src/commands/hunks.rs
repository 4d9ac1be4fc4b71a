use std::path::PathBuf;

use clap::Args;

use devrank_diff::{parse_hunk_intervals, parse_hunks};

#[derive(Args, Debug)]
pub struct HunksArgs {
    /// Patch file (`-` for stdin)
    pub patch: PathBuf,
    /// Print full headers (old and new side) instead of old-file intervals
    #[arg(long)]
    pub full: bool,
}

pub fn run(args: &HunksArgs) -> anyhow::Result<()> {
    let text = super::read_input(&args.patch)?;
    if args.full {
        super::print_json(&parse_hunks(&text))
    } else {
        super::print_json(&parse_hunk_intervals(&text))
    }
}
