// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Share Vault Simulator
//!
//! Library half of the `share-vault` binary: the scenario format and runner,
//! and the Prometheus metrics fed from the vault's event journal. Split out
//! of `main.rs` so integration tests can drive a run without a subprocess.

pub mod metrics;
pub mod scenario;

pub use metrics::VaultMetrics;
pub use scenario::{run, Amount, Report, Scenario, ScenarioError, Step};
