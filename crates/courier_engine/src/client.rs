use std::sync::Arc;

use bytes::Bytes;
use courier_core::{JobStatus, WorkItem};
use courier_logging::{courier_debug, courier_info, courier_trace, courier_warn};
use reqwest::multipart::{Form, Part};

use crate::submit::upload_stream;
use crate::types::map_reqwest_error;
use crate::wire::{
    parse_status, Domain, DomainsBody, SubmitResponse, SupportedFileType, SupportedFileTypesBody,
};
use crate::{
    ClientSettings, JobHandle, JobId, JobSubmitter, ProgressSink, StatusSource, TransportError,
};

const UPLOAD_PATH: &str = "/v1/documents/upload";
const STATUS_PATH: &str = "/v1/documents/status";
const DOMAINS_PATH: &str = "/v1/system/domains";
const FILE_TYPES_PATH: &str = "/v1/system/supported-file-types";
pub(crate) const HEALTH_PATH: &str = "/health";

/// reqwest-backed client for the ingestion service.
#[derive(Debug, Clone)]
pub struct IngestionClient {
    http: reqwest::Client,
    settings: ClientSettings,
}

impl IngestionClient {
    pub fn new(settings: ClientSettings) -> Result<Self, TransportError> {
        let http = build_http(&settings)?;
        Ok(Self { http, settings })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub async fn health(&self) -> Result<(), TransportError> {
        let url = self.settings.ingestion_endpoint(HEALTH_PATH);
        get_bytes(&self.http, &url, self.settings.status_timeout)
            .await
            .map(|_| ())
    }

    pub async fn domains(&self) -> Result<Vec<Domain>, TransportError> {
        let url = self.settings.ingestion_endpoint(DOMAINS_PATH);
        let body = get_bytes(&self.http, &url, self.settings.status_timeout).await?;
        let parsed: DomainsBody = serde_json::from_slice(&body)
            .map_err(|err| TransportError::MalformedResponse(err.to_string()))?;
        Ok(parsed.domains)
    }

    pub async fn supported_file_types(&self) -> Result<Vec<SupportedFileType>, TransportError> {
        let url = self.settings.ingestion_endpoint(FILE_TYPES_PATH);
        let body = get_bytes(&self.http, &url, self.settings.status_timeout).await?;
        let parsed: SupportedFileTypesBody = serde_json::from_slice(&body)
            .map_err(|err| TransportError::MalformedResponse(err.to_string()))?;
        Ok(parsed.supported_file_types)
    }
}

pub(crate) fn build_http(settings: &ClientSettings) -> Result<reqwest::Client, TransportError> {
    reqwest::Client::builder()
        .connect_timeout(settings.connect_timeout)
        .build()
        .map_err(|err| TransportError::Network(err.to_string()))
}

/// GET `url` and return the body of a 2xx response.
pub(crate) async fn get_bytes(
    http: &reqwest::Client,
    url: &str,
    timeout: std::time::Duration,
) -> Result<Bytes, TransportError> {
    let response = http
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(map_reqwest_error)?;
    read_success(response).await
}

/// Body of a 2xx response, or `ServerError` carrying the body text.
pub(crate) async fn read_success(response: reqwest::Response) -> Result<Bytes, TransportError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(TransportError::ServerError {
            status: status.as_u16(),
            body,
        });
    }
    response.bytes().await.map_err(map_reqwest_error)
}

#[async_trait::async_trait]
impl JobSubmitter for IngestionClient {
    async fn submit(
        &self,
        item: &WorkItem,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<JobHandle, TransportError> {
        let payload = Bytes::copy_from_slice(item.payload().as_bytes());
        let total = payload.len() as u64;
        courier_info!(
            "Submitting {} ({} bytes) to domain {}",
            item.name(),
            total,
            item.domain()
        );

        let body = reqwest::Body::wrap_stream(upload_stream(
            payload,
            self.settings.upload_chunk_size,
            sink,
        ));
        let file = Part::stream_with_length(body, total)
            .file_name(item.name().to_string())
            .mime_str(item.content_type())
            .map_err(map_reqwest_error)?;
        let form = Form::new()
            .part("file", file)
            .text("domain", item.domain().to_string())
            .text("source_info", item.metadata().to_source_info());

        let url = self.settings.ingestion_endpoint(UPLOAD_PATH);
        let response = self
            .http
            .post(&url)
            .timeout(self.settings.submit_timeout)
            .multipart(form)
            .send()
            .await
            .map_err(|err| {
                let err = map_reqwest_error(err);
                courier_warn!("Upload of {} failed: {}", item.name(), err);
                err
            })?;

        let body = read_success(response).await?;
        let accepted: SubmitResponse = serde_json::from_slice(&body)
            .map_err(|err| TransportError::MalformedResponse(err.to_string()))?;
        if accepted.job_id.trim().is_empty() {
            return Err(TransportError::MalformedResponse(
                "empty job_id in upload response".to_string(),
            ));
        }

        courier_info!("{} accepted as job {}", item.name(), accepted.job_id);
        Ok(JobHandle::new(JobId::new(accepted.job_id)))
    }
}

#[async_trait::async_trait]
impl StatusSource for IngestionClient {
    async fn status(&self, job_id: &JobId) -> Result<Option<JobStatus>, TransportError> {
        let url = self
            .settings
            .ingestion_endpoint(&format!("{STATUS_PATH}/{job_id}"));
        courier_trace!("Polling {}", url);
        let body = get_bytes(&self.http, &url, self.settings.status_timeout).await?;
        let status = parse_status(&body)?;
        courier_debug!("Job {} status: {:?}", job_id, status);
        Ok(status)
    }
}
