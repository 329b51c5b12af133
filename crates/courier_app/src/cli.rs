use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::Overrides;
use crate::logging::LogDestination;

#[derive(Parser)]
#[command(name = "courier")]
#[command(about = "Upload documents for ingestion and ask questions about them")]
#[command(version)]
pub struct Cli {
    /// Config file path (defaults to ./courier.ron when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the ingestion service
    #[arg(long, global = true)]
    pub ingestion_url: Option<String>,

    /// Base URL of the query service
    #[arg(long, global = true)]
    pub orchestrator_url: Option<String>,

    /// Milliseconds between job status checks
    #[arg(long, global = true)]
    pub poll_interval_ms: Option<u64>,

    /// Where log output goes
    #[arg(long, value_enum, global = true)]
    pub log: Option<LogDestination>,

    /// More log detail (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            ingestion_url: self.ingestion_url.clone(),
            orchestrator_url: self.orchestrator_url.clone(),
            poll_interval_ms: self.poll_interval_ms,
            log_destination: self.log,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload one or more files; several files are processed as a batch
    Ingest {
        /// Files to upload, in order
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Knowledge domain to file the documents under
        #[arg(short, long)]
        domain: String,
        #[command(flatten)]
        metadata: MetadataArgs,
    },

    /// Upload a piece of text as a document
    IngestText {
        /// Knowledge domain to file the document under
        #[arg(short, long)]
        domain: String,
        /// Text to upload (read from stdin when omitted)
        #[arg(long)]
        text: Option<String>,
        #[command(flatten)]
        metadata: MetadataArgs,
    },

    /// Ask a single question
    Ask {
        query: String,
        /// Restrict the search to one domain
        #[arg(short, long)]
        domain: Option<String>,
    },

    /// Interactive question session; /clear, /reset and /quit are commands
    Chat {
        /// Restrict the search to one domain
        #[arg(short, long)]
        domain: Option<String>,
    },

    /// Check that both services respond
    Health,

    /// List the domains documents can be filed under
    Domains,

    /// List the file formats the ingestion service accepts
    FileTypes,
}

#[derive(Args, Debug, Clone, Default)]
pub struct MetadataArgs {
    /// Document title (defaults to the file name without extension)
    #[arg(long)]
    pub title: Option<String>,
    /// Document author
    #[arg(long)]
    pub author: Option<String>,
    /// Publication date, YYYY-MM-DD
    #[arg(long)]
    pub date: Option<String>,
    /// Where the document came from
    #[arg(long)]
    pub url: Option<String>,
    /// Free-form notes
    #[arg(long)]
    pub notes: Option<String>,
}

impl MetadataArgs {
    pub fn into_metadata(self) -> courier_core::Metadata {
        courier_core::Metadata {
            title: self.title.unwrap_or_default(),
            author: self.author.unwrap_or_default(),
            publication_date: self.date.unwrap_or_default(),
            url: self.url.unwrap_or_default(),
            notes: self.notes.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn file_types_is_kebab_cased() {
        let cli = Cli::try_parse_from(["courier", "file-types"]).unwrap();
        assert!(matches!(cli.command, Commands::FileTypes));
    }

    #[test]
    fn ingest_takes_files_and_metadata() {
        let cli = Cli::try_parse_from([
            "courier",
            "--poll-interval-ms",
            "250",
            "ingest",
            "a.pdf",
            "b.docx",
            "--domain",
            "ai",
            "--author",
            "Ada",
        ])
        .unwrap();
        assert_eq!(cli.overrides().poll_interval_ms, Some(250));
        let Commands::Ingest {
            files,
            domain,
            metadata,
        } = cli.command
        else {
            panic!("expected ingest");
        };
        assert_eq!(files.len(), 2);
        assert_eq!(domain, "ai");
        assert_eq!(metadata.into_metadata().author, "Ada");
    }

    #[test]
    fn ingest_requires_a_file() {
        assert!(Cli::try_parse_from(["courier", "ingest", "--domain", "ai"]).is_err());
    }
}
