//! # Structured Logging
//!
//! `tracing` subscriber for the simulator. Vault operations log through the
//! library crates; this module only decides where those records go and how
//! they look.
//!
//! Everything goes to stderr. Stdout is reserved for the JSON report.

use clap::ValueEnum;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format, selected with `--log-format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Colored, one event per line.
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Installs the global subscriber. Panics if one is already installed.
///
/// `RUST_LOG` wins over `default_level` when set, e.g. to trace the rate
/// engine during a replay:
///
/// ```text
/// RUST_LOG=vault_protocol::rate=debug,vault_contracts=info
/// ```
pub fn init_logging(default_level: &str, format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_file(false),
            )
            .init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(false),
            )
            .init(),
    }

    tracing::debug!(?format, "subscriber installed");
}
