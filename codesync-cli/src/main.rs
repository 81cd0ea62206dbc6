//! codesync: keep generated UI code and local edits in step.
//!
//! # Usage
//!
//! ```text
//! codesync init [--dir <path>] [--src-dir <path>] [--lang ts|js] [--scheme blackbox|direct]
//! codesync sync [--config <path>] [--projects <id[@range]>]... [--components <id|name>]...
//!               [--only-existing] [--force-overwrite] [--new-component-scheme blackbox|direct]
//!               [--append-jsx-on-missing-base] [--recursive] [--include-dependencies]
//!               [--non-interactive] [--dry-run]
//! ```

mod auth;
mod commands;
mod remote;

use clap::{Parser, Subcommand};
use colored::Colorize;

use codesync_sync::SyncError;

use commands::{init::InitArgs, sync::SyncArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "codesync",
    version,
    about = "Sync generated component code into a local codebase",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a codesync.json in the current (or given) directory.
    Init(InitArgs),

    /// Fetch, reconcile and write generated code for the configured projects.
    Sync(SyncArgs),
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Init(args) => args.run(),
        Commands::Sync(args) => args.run(),
    };
    if let Err(err) = result {
        report_error(&err);
        std::process::exit(1);
    }
}

/// Handled sync errors read as a single message; anything else keeps its
/// cause chain.
fn report_error(err: &anyhow::Error) {
    let label = "error:".red().bold();
    match err.downcast_ref::<SyncError>() {
        Some(sync) if sync.is_handled() => eprintln!("{label} {sync}"),
        _ => eprintln!("{label} {err:?}"),
    }
}
