use std::path::PathBuf;

use clap::Args;
use tracing::info;

use devrank_diff::parse_patch;

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Single-file patch (`-` for stdin)
    pub patch: PathBuf,
}

pub fn run(args: &ParseArgs) -> anyhow::Result<()> {
    let text = super::read_input(&args.patch)?;
    let diff = parse_patch(&text);
    info!(
        additions = diff.additions.len(),
        deletions = diff.deletions.len(),
        added_lines = diff.added_lines(),
        deleted_lines = diff.deleted_lines(),
        "Parsed patch"
    );
    super::print_json(&diff)
}
