//! # ves CLI entry point
//!
//! Argument parsing plus dispatch; the real work lives in the subcommand
//! modules.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ves_cli::inspect::{run_inspect, InspectArgs};
use ves_cli::verify::{run_verify, VerifyArgs};

/// VeriStamp evidence package tool.
///
/// Works on exported evidence package files: replays every integrity
/// commitment a package carries (evidence hash, package hash, custody
/// chain, manifest, Merkle proof) and prints human-readable summaries.
/// Everything runs offline from the package document alone.
#[derive(Parser, Debug)]
#[command(name = "ves", version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Verify every integrity commitment in an exported package.
    #[command(name = "verify-package")]
    VerifyPackage(VerifyArgs),

    /// Print a human-readable summary of an exported package.
    Inspect(InspectArgs),
}

fn verbosity_filter(level: u8) -> EnvFilter {
    EnvFilter::new(match level {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(verbosity_filter(cli.verbose))
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::VerifyPackage(args) => run_verify(&args),
        Commands::Inspect(args) => run_inspect(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
