use std::sync::Arc;
use std::time::Duration;

use courier_core::{CompletionDetails, WorkItem};
use courier_logging::courier_debug;
use tokio_util::sync::CancellationToken;

use crate::{
    EngineEvent, IngestionClient, JobError, JobSubmitter, PollOutcome, ProgressSink,
    StatusPoller, StatusSource,
};

/// Drives one item through submission and polling to a terminal state.
#[derive(Clone)]
pub struct JobRunner {
    submitter: Arc<dyn JobSubmitter>,
    poller: StatusPoller,
}

impl JobRunner {
    pub fn new(
        submitter: Arc<dyn JobSubmitter>,
        status: Arc<dyn StatusSource>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            submitter,
            poller: StatusPoller::new(status, poll_interval),
        }
    }

    /// Runner that both submits and polls through `client`.
    pub fn for_client(client: Arc<IngestionClient>) -> Self {
        let interval = client.settings().poll_interval;
        Self::new(client.clone(), client, interval)
    }

    pub async fn run(
        &self,
        item: &WorkItem,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<CompletionDetails, JobError> {
        self.run_until(item, sink, &CancellationToken::new()).await
    }

    /// Run `item`, giving up with [`JobError::Aborted`] once `cancel` fires.
    /// Cancelling during the upload drops the request, which aborts it.
    pub async fn run_until(
        &self,
        item: &WorkItem,
        sink: Arc<dyn ProgressSink>,
        cancel: &CancellationToken,
    ) -> Result<CompletionDetails, JobError> {
        let submitted = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(JobError::Aborted),
            submitted = self.submitter.submit(item, Arc::clone(&sink)) => submitted,
        };
        let handle = submitted?;
        sink.emit(EngineEvent::JobAccepted {
            job_id: handle.id().clone(),
        });

        let status_sink = Arc::clone(&sink);
        let poller = self.poller.start_linked(
            handle,
            move |status| status_sink.emit(EngineEvent::Status(status)),
            cancel,
        );
        courier_debug!("Waiting for job {}", poller.job_id());

        match poller.wait().await {
            PollOutcome::Completed(details) => Ok(details),
            PollOutcome::Failed(reason) => Err(JobError::Failed(reason)),
            PollOutcome::Aborted => Err(JobError::Aborted),
        }
    }
}
