//! wikisync — incremental uploader for iGEM team wikis.
//!
//! # Usage
//!
//! ```text
//! wikisync sync --team <name> --src <dir> --build <dir> [--year <year>] [--dry-run]
//! wikisync status [--json]
//! ```
//!
//! Every option can also come from `wikisync.yml` in the working directory
//! (or `--config <file>`). Live syncs read `IGEM_USERNAME` and
//! `IGEM_PASSWORD` from the environment.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{status::StatusArgs, sync::SyncArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "wikisync",
    version,
    about = "Upload only what changed to an iGEM team wiki",
    long_about = None,
)]
struct Cli {
    /// Log debug details (same as RUST_LOG=debug).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rewrite links, then upload changed assets and pages.
    Sync(SyncArgs),

    /// Compare the source tree with the upload map without uploading.
    Status(StatusArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Sync(args) => args.run(),
        Commands::Status(args) => args.run(),
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
