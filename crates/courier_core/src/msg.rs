use crate::JobStatus;

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// A new item is about to be uploaded; resets the display.
    Started { name: String, size: Option<u64> },
    /// Bytes handed to the transport so far.
    TransferProgress { sent: u64, total: Option<u64> },
    /// The request body has been fully sent; no server response yet.
    TransferComplete,
    /// The service accepted the upload and assigned a job id.
    JobAccepted { job_id: String },
    /// A status observed by the poller.
    Status(JobStatus),
    /// Submission failed before a job id was assigned.
    TransportFailed { reason: String },
}
