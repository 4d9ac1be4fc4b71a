use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use devrank_diff::{
    FunctionRange, SourceTexts, changed_function_stats, changed_functions, parse_patch,
    validate_function_ranges,
};

#[derive(Args, Debug)]
pub struct AttributeArgs {
    /// Single-file patch (`-` for stdin)
    pub patch: PathBuf,
    /// JSON list of `{"name", "range": {"start", "end"}}` for the old file
    #[arg(long)]
    pub functions: PathBuf,
    /// Report adds and dels separately
    #[arg(long)]
    pub stats: bool,
    /// Old version of the file, for logical-unit counts (implies --stats)
    #[arg(long, requires = "new_source")]
    pub old_source: Option<PathBuf>,
    /// New version of the file, for logical-unit counts (implies --stats)
    #[arg(long, requires = "old_source")]
    pub new_source: Option<PathBuf>,
}

pub fn run(args: &AttributeArgs) -> anyhow::Result<()> {
    let diff = parse_patch(&super::read_input(&args.patch)?);
    let functions: Vec<FunctionRange> = super::read_json(&args.functions)?;
    diff.validate()
        .with_context(|| format!("Diff error in {}", args.patch.display()))?;
    validate_function_ranges(&functions)
        .with_context(|| format!("Diff error in {}", args.functions.display()))?;

    let sources = match (&args.old_source, &args.new_source) {
        (Some(old), Some(new)) => Some((super::read_input(old)?, super::read_input(new)?)),
        _ => None,
    };

    if args.stats || sources.is_some() {
        let texts = sources.as_ref().map(|(old, new)| SourceTexts { old, new });
        let stats: BTreeMap<_, _> = changed_function_stats(&functions, &diff, texts)
            .into_iter()
            .collect();
        super::print_json(&stats)
    } else {
        let churn: BTreeMap<_, _> = changed_functions(&functions, &diff).into_iter().collect();
        super::print_json(&churn)
    }
}
