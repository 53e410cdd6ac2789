// Stratplan - strategic planning and budget approval client
// Main entry point

use anyhow::Result;
use clap::Parser;

use stratplan::cli::{dispatch, Cli};
use stratplan::config::{load_config, load_config_from};
use stratplan::logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.verbose)?;

    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    tracing::debug!(api_url = %config.api_url, "Configuration loaded");

    dispatch(cli, config).await
}
