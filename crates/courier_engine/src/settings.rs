use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Base URL of the job-accepting (ingestion) service.
    pub ingestion_url: String,
    /// Base URL of the query (orchestrator) service.
    pub orchestrator_url: String,
    pub connect_timeout: Duration,
    /// Whole-request budget for one upload, transfer included.
    pub submit_timeout: Duration,
    pub status_timeout: Duration,
    pub query_timeout: Duration,
    pub poll_interval: Duration,
    /// Size of the slices the upload body is streamed in; one transfer
    /// event is emitted per slice.
    pub upload_chunk_size: usize,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            ingestion_url: "http://localhost:8000".to_string(),
            orchestrator_url: "http://localhost:8001".to_string(),
            connect_timeout: Duration::from_secs(10),
            submit_timeout: Duration::from_secs(300),
            status_timeout: Duration::from_secs(30),
            query_timeout: Duration::from_secs(120),
            poll_interval: Duration::from_millis(2000),
            upload_chunk_size: 64 * 1024,
        }
    }
}

impl ClientSettings {
    pub(crate) fn ingestion_endpoint(&self, path: &str) -> String {
        join_url(&self.ingestion_url, path)
    }

    pub(crate) fn orchestrator_endpoint(&self, path: &str) -> String {
        join_url(&self.orchestrator_url, path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_join_without_double_slashes() {
        let settings = ClientSettings {
            ingestion_url: "http://host/api/ingestion/".to_string(),
            ..ClientSettings::default()
        };
        assert_eq!(
            settings.ingestion_endpoint("/v1/documents/upload"),
            "http://host/api/ingestion/v1/documents/upload"
        );
        assert_eq!(
            settings.orchestrator_endpoint("v1/query"),
            "http://localhost:8001/v1/query"
        );
    }
}
