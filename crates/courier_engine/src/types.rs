use std::fmt;

use chrono::{DateTime, Utc};
use courier_core::{BatchOutcome, FailureReason, ItemRef, JobStatus};

/// Opaque identifier assigned by the job-accepting service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key for all polling of one submitted job.
///
/// Deliberately not `Clone`: a handle moves into exactly one
/// [`crate::StatusPoller`], so two pollers can never share a job.
#[derive(Debug, PartialEq, Eq)]
pub struct JobHandle {
    id: JobId,
    created_at: DateTime<Utc>,
}

impl JobHandle {
    pub fn new(id: JobId) -> Self {
        Self {
            id,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A batch item left the queue and is about to be submitted.
    ItemStarted {
        item: ItemRef,
        size: u64,
        position: usize,
        total: usize,
    },
    /// Payload bytes handed to the transport so far.
    Transfer { sent: u64, total: Option<u64> },
    /// The whole request body has been sent.
    TransferComplete,
    JobAccepted { job_id: JobId },
    Status(JobStatus),
    ItemFinished(BatchOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("server error {status}: {body}")]
    ServerError { status: u16, body: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl TransportError {
    /// Short, human-readable reason, as shown next to a skipped batch item.
    pub fn reason(&self) -> String {
        match self {
            TransportError::Network(_) => "Network error".to_string(),
            TransportError::Timeout(_) => "Request timed out".to_string(),
            TransportError::ServerError { status, body } => {
                server_message(body).unwrap_or_else(|| format!("HTTP error {status}"))
            }
            TransportError::MalformedResponse(_) => "Invalid JSON response".to_string(),
        }
    }

    /// Underlying detail, without the category prefix `Display` adds.
    pub fn detail(&self) -> &str {
        match self {
            TransportError::Network(detail)
            | TransportError::Timeout(detail)
            | TransportError::MalformedResponse(detail) => detail,
            TransportError::ServerError { body, .. } => body,
        }
    }
}

/// Pull a message out of the error bodies the services produce:
/// `{"detail": {"error": {"message": ..}}}`, `{"error": {"message": ..}}`,
/// `{"detail": ".."}` or `{"message": ".."}`.
pub(crate) fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["/detail/error/message", "/error/message", "/detail", "/message"]
        .iter()
        .find_map(|pointer| value.pointer(pointer)?.as_str())
        .filter(|message| !message.trim().is_empty())
        .map(ToOwned::to_owned)
}

/// Failure of a single, non-batch job flow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobError {
    #[error("submission failed: {0}")]
    Transport(#[from] TransportError),
    #[error("job failed: {0}")]
    Failed(FailureReason),
    #[error("job was cancelled before it finished")]
    Aborted,
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout(err.to_string());
    }
    if err.is_decode() {
        return TransportError::MalformedResponse(err.to_string());
    }
    TransportError::Network(err.to_string())
}
