//! `courier.ron` loading and merging with command-line overrides.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use courier_core::ProgressPolicy;
use courier_engine::ClientSettings;
use serde::Deserialize;

use crate::logging::{LogDestination, DEFAULT_LOG_FILE};

pub const DEFAULT_CONFIG_FILE: &str = "courier.ron";

/// On-disk configuration. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub ingestion_url: Option<String>,
    pub orchestrator_url: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    pub submit_timeout_secs: Option<u64>,
    pub status_timeout_secs: Option<u64>,
    pub query_timeout_secs: Option<u64>,
    pub upload_chunk_size: Option<usize>,
    pub small_payload_threshold: Option<u64>,
    pub small_payload_ceiling: Option<u8>,
    pub log_destination: Option<LogDestination>,
    pub log_file: Option<PathBuf>,
}

/// Values given on the command line; they win over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub ingestion_url: Option<String>,
    pub orchestrator_url: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub log_destination: Option<LogDestination>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub client: ClientSettings,
    pub progress: ProgressPolicy,
    pub log_destination: LogDestination,
    pub log_file: PathBuf,
}

/// Read the config file. An explicit path must exist; the default
/// `courier.ron` is optional. Runs before logging is up, so it does not log.
pub fn load(explicit: Option<&Path>) -> anyhow::Result<FileConfig> {
    let path = explicit.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if explicit.is_none() && err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(FileConfig::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("reading config file {}", path.display()))
        }
    };
    ron::from_str(&content).with_context(|| format!("parsing config file {}", path.display()))
}

pub fn resolve(file: FileConfig, overrides: Overrides) -> AppConfig {
    let defaults = ClientSettings::default();
    let secs = |value: Option<u64>, fallback: Duration| value.map_or(fallback, Duration::from_secs);

    let client = ClientSettings {
        ingestion_url: overrides
            .ingestion_url
            .or(file.ingestion_url)
            .unwrap_or(defaults.ingestion_url),
        orchestrator_url: overrides
            .orchestrator_url
            .or(file.orchestrator_url)
            .unwrap_or(defaults.orchestrator_url),
        connect_timeout: secs(file.connect_timeout_secs, defaults.connect_timeout),
        submit_timeout: secs(file.submit_timeout_secs, defaults.submit_timeout),
        status_timeout: secs(file.status_timeout_secs, defaults.status_timeout),
        query_timeout: secs(file.query_timeout_secs, defaults.query_timeout),
        poll_interval: overrides
            .poll_interval_ms
            .or(file.poll_interval_ms)
            .map_or(defaults.poll_interval, Duration::from_millis),
        upload_chunk_size: file
            .upload_chunk_size
            .filter(|size| *size > 0)
            .unwrap_or(defaults.upload_chunk_size),
    };

    let policy_defaults = ProgressPolicy::default();
    let progress = ProgressPolicy {
        small_payload_threshold: file
            .small_payload_threshold
            .unwrap_or(policy_defaults.small_payload_threshold),
        small_payload_ceiling: file
            .small_payload_ceiling
            .unwrap_or(policy_defaults.small_payload_ceiling),
    };

    AppConfig {
        client,
        progress,
        log_destination: overrides
            .log_destination
            .or(file.log_destination)
            .unwrap_or_default(),
        log_file: file
            .log_file
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_config_yields_defaults() {
        let config = resolve(FileConfig::default(), Overrides::default());
        assert_eq!(config.client, ClientSettings::default());
        assert_eq!(config.progress, ProgressPolicy::default());
        assert_eq!(config.log_destination, LogDestination::File);
        assert_eq!(config.log_file, PathBuf::from(DEFAULT_LOG_FILE));
    }

    #[test]
    fn file_values_apply_and_flags_win() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"(
                ingestion_url: Some("http://ingest:9000"),
                orchestrator_url: Some("http://orch:9001"),
                poll_interval_ms: Some(500),
                query_timeout_secs: Some(5),
                small_payload_ceiling: Some(40),
                log_destination: Some(both),
            )"#
        )
        .unwrap();

        let loaded = load(Some(file.path())).unwrap();
        let config = resolve(
            loaded,
            Overrides {
                orchestrator_url: Some("http://flag:1".to_string()),
                ..Overrides::default()
            },
        );

        assert_eq!(config.client.ingestion_url, "http://ingest:9000");
        assert_eq!(config.client.orchestrator_url, "http://flag:1");
        assert_eq!(config.client.poll_interval, Duration::from_millis(500));
        assert_eq!(config.client.query_timeout, Duration::from_secs(5));
        assert_eq!(config.client.submit_timeout, Duration::from_secs(300));
        assert_eq!(config.progress.small_payload_ceiling, 40);
        assert_eq!(config.log_destination, LogDestination::Both);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.ron");
        assert!(load(Some(&missing)).is_err());
    }

    #[test]
    fn garbage_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "this is not ron").unwrap();
        assert!(load(Some(file.path())).is_err());
    }

    #[test]
    fn zero_chunk_size_falls_back() {
        let file = FileConfig {
            upload_chunk_size: Some(0),
            ..FileConfig::default()
        };
        let config = resolve(file, Overrides::default());
        assert_eq!(config.client.upload_chunk_size, 64 * 1024);
    }
}
