use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Generic reason used when the server reports a failure without a message.
pub const GENERIC_FAILURE: &str = "Processing failed";

/// Fields the ingestion service attaches to a completed job.
///
/// Every field is optional; keys the client does not know about are kept
/// verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompletionDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunks_created: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_extracted: Option<bool>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Why a job ended in [`JobStatus::Failed`].
///
/// A job the server rejected and a job we lost sight of both end the same
/// way, but they are labelled differently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The server reported the job as failed.
    Job(String),
    /// Polling itself broke (network, non-2xx, unparsable body).
    Polling(String),
}

impl FailureReason {
    pub fn job(message: Option<String>) -> Self {
        match message {
            Some(message) if !message.trim().is_empty() => Self::Job(message),
            _ => Self::Job(GENERIC_FAILURE.to_string()),
        }
    }

    pub fn is_polling(&self) -> bool {
        matches!(self, Self::Polling(_))
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Job(message) => write!(f, "{message}"),
            FailureReason::Polling(detail) => write!(f, "polling error: {detail}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    Queued,
    Processing {
        stage_percent: u8,
        stage_label: String,
    },
    Completed {
        details: CompletionDetails,
    },
    Failed {
        reason: FailureReason,
    },
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed { .. } | JobStatus::Failed { .. })
    }

    fn rank(&self) -> u8 {
        match self {
            JobStatus::Queued => 0,
            JobStatus::Processing { .. } => 1,
            JobStatus::Completed { .. } | JobStatus::Failed { .. } => 2,
        }
    }

    /// Whether moving from `self` to `next` respects
    /// `Queued -> Processing* -> Completed | Failed`.
    ///
    /// Nothing leaves a terminal state, and a processing update never
    /// reports less progress than the one before it.
    pub fn can_transition_to(&self, next: &JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self, next) {
            (
                JobStatus::Processing {
                    stage_percent: prev,
                    ..
                },
                JobStatus::Processing {
                    stage_percent: next,
                    ..
                },
            ) => next >= prev,
            _ => next.rank() >= self.rank(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_reason_labels_differ() {
        assert_eq!(FailureReason::Job("bad pdf".into()).to_string(), "bad pdf");
        assert_eq!(
            FailureReason::Polling("HTTP error 500".into()).to_string(),
            "polling error: HTTP error 500"
        );
    }

    #[test]
    fn missing_or_blank_message_uses_generic_reason() {
        assert_eq!(FailureReason::job(None), FailureReason::Job(GENERIC_FAILURE.into()));
        assert_eq!(
            FailureReason::job(Some("  ".into())),
            FailureReason::Job(GENERIC_FAILURE.into())
        );
    }
}
