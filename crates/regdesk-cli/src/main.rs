//! # regdesk CLI entry point
//!
//! Parses command-line arguments, connects to the backend configured in
//! the environment, and dispatches to subcommand handlers. Results are
//! printed as JSON on stdout; logs go to stderr.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use regdesk_cli::companies::{run_companies, CompaniesArgs};
use regdesk_cli::export::{run_export, ExportArgs};
use regdesk_cli::generate::{run_generate, run_submit, GenerateArgs, SubmitArgs};
use regdesk_cli::records::{run_controls, run_laws, ControlsArgs, LawsArgs};
use regdesk_cli::{print_json, Console};

/// regdesk compliance console
///
/// Browse companies, laws, and control framework entries, run generation,
/// submit for verification, and export entries. Reads the backend and
/// webhook settings from `REGDESK_*` environment variables.
#[derive(Parser, Debug)]
#[command(name = "regdesk", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Company list and detail.
    Companies(CompaniesArgs),

    /// A company's laws and regulations.
    Laws(LawsArgs),

    /// A company's control framework.
    Controls(ControlsArgs),

    /// Generate laws or control framework entries.
    Generate(GenerateArgs),

    /// Mark a company's control framework as verified.
    Submit(SubmitArgs),

    /// Export one control framework entry as xlsx.
    Export(ExportArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let console = match Console::from_env() {
        Ok(console) => console,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::from(2);
        }
    };

    let result = match &cli.command {
        Commands::Companies(args) => run_companies(args, &console).await,
        Commands::Laws(args) => run_laws(args, &console).await,
        Commands::Controls(args) => run_controls(args, &console).await,
        Commands::Generate(args) => run_generate(args, &console).await,
        Commands::Submit(args) => run_submit(args, &console).await,
        Commands::Export(args) => run_export(args, &console).await,
    };

    match result.and_then(|output| print_json(&output)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
