//! Logging configuration for the gateway.
//!
//! Logs go to stderr. `RUST_LOG` takes precedence over the CLI default filter.

use std::io;

use tracing_subscriber::fmt::format::{DefaultFields, Format};
use tracing_subscriber::fmt::SubscriberBuilder;
use tracing_subscriber::EnvFilter;

type StderrBuilder = SubscriberBuilder<DefaultFields, Format, EnvFilter, fn() -> io::Stderr>;

/// Builds the log filter from `RUST_LOG`, falling back to `default_filter`,
/// and to `info` if that does not parse either.
pub fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn stderr_builder(default_filter: &str) -> StderrBuilder {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_filter))
        .with_writer(io::stderr as fn() -> io::Stderr)
}

/// Initializes logging to stderr.
pub fn init_stderr_logging(default_filter: &str) -> anyhow::Result<()> {
    stderr_builder(default_filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Could not initialize logging: {e}"))
}
