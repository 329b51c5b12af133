//! JSON bodies exchanged with the ingestion and orchestrator services.

use courier_core::{CompletionDetails, FailureReason, JobStatus, Source};
use serde::{Deserialize, Serialize};

use crate::TransportError;

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitResponse {
    pub job_id: String,
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: String,
    #[serde(default)]
    progress: Option<ProgressBody>,
    #[serde(default)]
    details: Option<CompletionDetails>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ProgressBody {
    #[serde(default)]
    percentage: Option<f64>,
    #[serde(default)]
    current_stage: Option<String>,
}

const DEFAULT_STAGE: &str = "processing";

/// Decode a status body.
///
/// `Ok(None)` means the job is still processing but the body carried no
/// usable progress, so there is nothing to report this tick.
pub fn parse_status(body: &[u8]) -> Result<Option<JobStatus>, TransportError> {
    let body: StatusBody = serde_json::from_slice(body)
        .map_err(|err| TransportError::MalformedResponse(err.to_string()))?;

    match body.status.as_str() {
        "queued" => Ok(Some(JobStatus::Queued)),
        "processing" => Ok(body.progress.and_then(|progress| {
            let percentage = progress.percentage.filter(|pct| pct.is_finite())?;
            Some(JobStatus::Processing {
                stage_percent: percentage.clamp(0.0, 100.0).floor() as u8,
                stage_label: progress
                    .current_stage
                    .unwrap_or_else(|| DEFAULT_STAGE.to_string()),
            })
        })),
        "completed" => Ok(Some(JobStatus::Completed {
            details: body.details.unwrap_or_default(),
        })),
        "failed" => {
            let message = body
                .error
                .as_ref()
                .and_then(|error| error.get("message"))
                .and_then(|message| message.as_str())
                .map(ToOwned::to_owned);
            Ok(Some(JobStatus::Failed {
                reason: FailureReason::job(message),
            }))
        }
        other => Err(TransportError::MalformedResponse(format!(
            "unknown job status '{other}'"
        ))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueryAnswer {
    pub response: String,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// A knowledge domain documents can be filed under.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Domain {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DomainsBody {
    pub domains: Vec<Domain>,
}

/// One upload format the ingestion service accepts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SupportedFileType {
    pub extension: String,
    pub mime_type: String,
    #[serde(default)]
    pub description: String,
    pub max_size_mb: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SupportedFileTypesBody {
    pub supported_file_types: Vec<SupportedFileType>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processing_without_progress_reports_nothing() {
        assert_eq!(parse_status(br#"{"status":"processing"}"#).unwrap(), None);
        assert_eq!(
            parse_status(br#"{"status":"processing","progress":{"current_stage":"x"}}"#).unwrap(),
            None
        );
    }

    #[test]
    fn processing_progress_is_clamped_and_labelled() {
        let status = parse_status(
            br#"{"status":"processing","progress":{"percentage":42.9,"current_stage":"chunking"}}"#,
        )
        .unwrap();
        assert_eq!(
            status,
            Some(JobStatus::Processing {
                stage_percent: 42,
                stage_label: "chunking".to_string()
            })
        );
        let status =
            parse_status(br#"{"status":"processing","progress":{"percentage":180}}"#).unwrap();
        assert_eq!(
            status,
            Some(JobStatus::Processing {
                stage_percent: 100,
                stage_label: DEFAULT_STAGE.to_string()
            })
        );
    }

    #[test]
    fn failed_without_message_uses_generic_reason() {
        let status = parse_status(br#"{"status":"failed","error":null}"#).unwrap();
        assert_eq!(
            status,
            Some(JobStatus::Failed {
                reason: FailureReason::Job(courier_core::GENERIC_FAILURE.to_string())
            })
        );
    }

    #[test]
    fn unknown_status_is_malformed() {
        let err = parse_status(br#"{"status":"paused"}"#).unwrap_err();
        assert!(matches!(err, TransportError::MalformedResponse(_)));
        let err = parse_status(b"not json").unwrap_err();
        assert!(matches!(err, TransportError::MalformedResponse(_)));
    }
}
