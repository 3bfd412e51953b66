//! # CLI Interface
//!
//! Defines the command-line argument structure for `share-vault` using
//! `clap` derive. Supports three subcommands: `simulate`, `init`, and
//! `version`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// Share vault simulator.
///
/// Replays a JSON scenario of deposits, rewards, withdrawals, clock moves and
/// admin calls against a fresh in-memory vault and prints a JSON report.
#[derive(Parser, Debug)]
#[command(
    name = "share-vault",
    about = "Share vault accounting simulator",
    version,
    propagate_version = true
)]
pub struct ShareVaultCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the simulator binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a scenario file and print the report to stdout.
    Simulate(SimulateArgs),
    /// Write a starter scenario file.
    Init(InitArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `simulate` subcommand.
#[derive(Parser, Debug)]
pub struct SimulateArgs {
    /// Path to the scenario file (JSON).
    #[arg(long, short = 's', env = "SHARE_VAULT_SCENARIO")]
    pub scenario: PathBuf,

    /// Include Prometheus text-format metrics in the report.
    #[arg(long)]
    pub metrics: bool,

    /// Write the final vault snapshot (JSON) to this path.
    #[arg(long)]
    pub state_out: Option<PathBuf>,

    /// Abort on the first failing step instead of recording it.
    #[arg(long)]
    pub strict: bool,

    /// Log output format. Logs go to stderr.
    #[arg(long, env = "SHARE_VAULT_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

/// Arguments for the `init` subcommand.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Where to write the starter scenario.
    #[arg(long, short = 'o', default_value = "scenario.json")]
    pub out: PathBuf,

    /// Overwrite an existing file.
    #[arg(long)]
    pub force: bool,
}
