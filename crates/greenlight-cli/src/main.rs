//! Greenlight CLI
//!
//! Drives the governed pipeline from a job document: one `run` takes content
//! through the gate, the boundary, and the evidence store; `verify`
//! re-derives completion from the evidence alone.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod run;
mod verify;

/// Greenlight - approval and execution governance for content pipelines
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one job through the governed path end to end
    Run {
        /// Path to the job document (JSON)
        #[arg(long, value_name = "FILE")]
        job: PathBuf,

        /// Directory holding the evidence records
        #[arg(long, value_name = "DIR", default_value = "evidence")]
        evidence_dir: PathBuf,

        /// Grant the batch override for this run's destructive call
        #[arg(long)]
        batch_override: bool,

        /// Engage a freeze flag for one destructive call class before running
        #[arg(long, value_name = "CLASS")]
        frozen: Option<String>,
    },

    /// Re-derive completion for a unit of work from its evidence
    Verify {
        /// Directory holding the evidence records
        #[arg(long, value_name = "DIR", default_value = "evidence")]
        evidence_dir: PathBuf,

        /// Unit-of-work identifier to verify
        work_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // RUST_LOG wins; --verbose only raises the default
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(cli.verbose)
        .init();

    match cli.command {
        Commands::Run {
            job,
            evidence_dir,
            batch_override,
            frozen,
        } => run::run(&job, &evidence_dir, batch_override, frozen).await,
        Commands::Verify {
            evidence_dir,
            work_id,
        } => verify::verify(&evidence_dir, &work_id).await,
    }
}
