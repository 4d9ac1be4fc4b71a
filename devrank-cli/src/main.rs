use clap::Parser;

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "devrank",
    version,
    about = "Attribute commit churn to functions and rank them by development effort"
)]
struct Cli {
    #[command(subcommand)]
    command: commands::Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,
}

/// Classify an error into an exit code.
///
/// Exit codes:
///   0  success
///   1  general/unknown error
///   2  configuration error
///   3  input file missing or unreadable
///   4  malformed input (JSON, diff ordering)
///   5  call-commit graph inconsistency
fn classify_exit_code(err: &anyhow::Error) -> i32 {
    let msg = format!("{err:#}");
    let lower = msg.to_lowercase();

    // Most specific markers first: paths may contain any of these words.
    if lower.contains("cannot read") {
        3
    } else if lower.contains("invalid json")
        || lower.contains("serialization error")
        || lower.contains("diff error")
        || lower.contains("overlaps the previous")
        || lower.contains("before the previous")
    {
        4
    } else if lower.contains("graph error")
        || lower.contains("unknown node")
        || lower.contains("unknown commit")
    {
        5
    } else if lower.contains("cannot load config")
        || lower.contains("invalid config")
        || lower.contains("configuration error")
    {
        2
    } else {
        1
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let filter = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (_, 0) => "warn",
        (_, 1) => "info",
        (_, 2) => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: Failed to create runtime: {e}");
            std::process::exit(1);
        }
    };

    match runtime.block_on(commands::run(cli.command)) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(classify_exit_code(&e));
        }
    }
}
