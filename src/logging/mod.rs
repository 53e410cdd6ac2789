// Logging setup for the CLI
//
// tracing subscriber writing to stderr, filtered by RUST_LOG when set and by
// the --verbose flag otherwise. `log` records from dependencies are bridged in.

use anyhow::{Context, Result};
use tracing_log::LogTracer;
use tracing_subscriber::EnvFilter;

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "stratplan=debug,info"
    } else {
        "stratplan=info,warn"
    }
}

/// Install the global subscriber. Call once, before any other work.
pub fn init(verbose: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")?;
    LogTracer::init().context("Failed to bridge log records into tracing")?;
    Ok(())
}
