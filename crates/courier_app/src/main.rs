mod cli;
mod commands;
mod config;
mod logging;
mod render;

use clap::Parser;
use courier_logging::{courier_info, level_for_verbosity};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let file = config::load(cli.config.as_deref())?;
    let config = config::resolve(file, cli.overrides());

    logging::initialize(
        config.log_destination,
        level_for_verbosity(cli.verbose),
        &config.log_file,
    );
    courier_info!(
        "courier {} (ingestion {}, orchestrator {})",
        env!("CARGO_PKG_VERSION"),
        config.client.ingestion_url,
        config.client.orchestrator_url
    );

    commands::dispatch(cli.command, config).await
}
