//! Subcommand implementations.

mod ask;
mod ingest;
mod system;

use crate::cli::Commands;
use crate::config::AppConfig;

pub async fn dispatch(command: Commands, config: AppConfig) -> anyhow::Result<()> {
    match command {
        Commands::Ingest {
            files,
            domain,
            metadata,
        } => ingest::ingest_files(&config, files, domain, metadata).await,
        Commands::IngestText {
            domain,
            text,
            metadata,
        } => ingest::ingest_text(&config, domain, text, metadata).await,
        Commands::Ask { query, domain } => ask::ask_once(&config, query, domain).await,
        Commands::Chat { domain } => ask::chat(&config, domain).await,
        Commands::Health => system::health(&config).await,
        Commands::Domains => system::domains(&config).await,
        Commands::FileTypes => system::file_types(&config).await,
    }
}
