// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Share Vault Simulator
//!
//! Entry point for the `share-vault` binary. Parses CLI arguments,
//! initializes logging, and dispatches to a subcommand:
//!
//! - `simulate` — replay a scenario file and print a JSON report
//! - `init`     — write a starter scenario
//! - `version`  — print build version information

mod cli;
mod logging;

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser;

use cli::{Commands, ShareVaultCli};
use vault_cli::{Scenario, VaultMetrics};

fn main() -> Result<()> {
    let cli = ShareVaultCli::parse();

    match cli.command {
        Commands::Simulate(args) => simulate(args),
        Commands::Init(args) => init_scenario(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Replays a scenario and prints the report to stdout.
fn simulate(args: cli::SimulateArgs) -> Result<()> {
    logging::init_logging(
        "vault_cli=info,vault_contracts=info,vault_protocol=warn",
        args.log_format,
    );

    let scenario = load_scenario(&args.scenario)?;
    tracing::info!(
        path = %args.scenario.display(),
        steps = scenario.steps.len(),
        accounts = scenario.balances.len(),
        "scenario loaded"
    );

    let metrics = if args.metrics {
        Some(VaultMetrics::new().context("failed to register metrics")?)
    } else {
        None
    };

    let report = vault_cli::run(&scenario, args.strict, metrics.as_ref())
        .context("scenario run failed")?;

    if let Some(path) = &args.state_out {
        let state = serde_json::to_string_pretty(&report.snapshot)
            .context("failed to serialize vault snapshot")?;
        std::fs::write(path, state)
            .with_context(|| format!("failed to write state to {}", path.display()))?;
        tracing::info!(path = %path.display(), "vault snapshot written");
    }

    let body = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
    println!("{}", body);
    Ok(())
}

fn load_scenario(path: &Path) -> Result<Scenario> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read scenario {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse scenario {}", path.display()))
}

/// Writes the starter scenario.
fn init_scenario(args: cli::InitArgs) -> Result<()> {
    let out = &args.out;
    if out.exists() && !args.force {
        bail!(
            "{} already exists (pass --force to overwrite)",
            out.display()
        );
    }

    let body = serde_json::to_string_pretty(&Scenario::starter())
        .context("failed to serialize starter scenario")?;
    std::fs::write(out, body)
        .with_context(|| format!("failed to write scenario to {}", out.display()))?;

    println!("Scenario written to {}", out.display());
    println!("Run it with: share-vault simulate --scenario {}", out.display());
    Ok(())
}

fn print_version() {
    println!("share-vault {}", env!("CARGO_PKG_VERSION"));
    println!("protocol    {}", vault_protocol::config::PROTOCOL_VERSION);
}
