//! Status polling for one submitted job.
//!
//! Polling is a plain loop: wait the interval, ask once, wait for the
//! answer, repeat. A new request is never issued while the previous one is
//! outstanding, however slow the service is.

use std::sync::Arc;
use std::time::Duration;

use courier_core::{CompletionDetails, FailureReason, JobStatus};
use courier_logging::{courier_debug, courier_error, courier_info, courier_warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::{JobHandle, JobId, TransportError};

#[async_trait::async_trait]
pub trait StatusSource: Send + Sync {
    /// One status request. `Ok(None)` means "still processing, nothing new
    /// to report".
    async fn status(&self, job_id: &JobId) -> Result<Option<JobStatus>, TransportError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Polling,
    Completed,
    Failed,
    Aborted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Completed(CompletionDetails),
    Failed(FailureReason),
    Aborted,
}

/// Starts one polling loop per [`JobHandle`].
#[derive(Clone)]
pub struct StatusPoller {
    source: Arc<dyn StatusSource>,
    interval: Duration,
}

impl StatusPoller {
    pub fn new(source: Arc<dyn StatusSource>, interval: Duration) -> Self {
        Self { source, interval }
    }

    /// Start polling `handle`, which the poller keeps for its whole life.
    ///
    /// `on_update` sees every non-terminal status that carries news, in
    /// order, and the terminal status exactly once. Calls never overlap.
    pub fn start<F>(&self, handle: JobHandle, on_update: F) -> PollerHandle
    where
        F: FnMut(JobStatus) + Send + 'static,
    {
        self.start_linked(handle, on_update, &CancellationToken::new())
    }

    /// Like [`StatusPoller::start`], but cancelling `parent` also stops
    /// this poller.
    pub fn start_linked<F>(
        &self,
        handle: JobHandle,
        on_update: F,
        parent: &CancellationToken,
    ) -> PollerHandle
    where
        F: FnMut(JobStatus) + Send + 'static,
    {
        let token = parent.child_token();
        let (state_tx, state_rx) = watch::channel(PollerState::Polling);
        let job_id = handle.id().clone();
        let job = PollJob {
            source: Arc::clone(&self.source),
            interval: self.interval,
            token: token.clone(),
            state: state_tx,
        };
        let task = tokio::spawn(job.run(handle, on_update));
        PollerHandle {
            job_id,
            stopper: PollStopper(token.clone()),
            state: state_rx,
            task,
            _guard: token.drop_guard(),
        }
    }
}

/// Cloneable stop switch, safe to use from inside `on_update`.
#[derive(Debug, Clone)]
pub struct PollStopper(CancellationToken);

impl PollStopper {
    /// Idempotent; also cancels a tick that is already scheduled or in flight.
    pub fn stop(&self) {
        self.0.cancel();
    }
}

/// Owner of one polling loop. Dropping it (or a pending [`PollerHandle::wait`])
/// stops the loop.
pub struct PollerHandle {
    job_id: JobId,
    stopper: PollStopper,
    state: watch::Receiver<PollerState>,
    task: JoinHandle<PollOutcome>,
    _guard: DropGuard,
}

impl PollerHandle {
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn stop(&self) {
        self.stopper.stop();
    }

    pub fn stopper(&self) -> PollStopper {
        self.stopper.clone()
    }

    pub fn state(&self) -> PollerState {
        *self.state.borrow()
    }

    /// Wait for the loop to end.
    pub async fn wait(self) -> PollOutcome {
        let PollerHandle {
            job_id,
            task,
            _guard,
            ..
        } = self;
        match task.await {
            Ok(outcome) => outcome,
            Err(err) => {
                courier_error!("Poller for job {} ended abnormally: {}", job_id, err);
                PollOutcome::Aborted
            }
        }
    }
}

struct PollJob {
    source: Arc<dyn StatusSource>,
    interval: Duration,
    token: CancellationToken,
    state: watch::Sender<PollerState>,
}

impl PollJob {
    async fn run<F>(self, handle: JobHandle, mut on_update: F) -> PollOutcome
    where
        F: FnMut(JobStatus),
    {
        let job_id = handle.id();
        let mut last: Option<JobStatus> = None;
        courier_debug!("Polling job {} every {:?}", job_id, self.interval);

        loop {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => return self.abort(job_id),
                _ = tokio::time::sleep(self.interval) => {}
            }

            let response = tokio::select! {
                biased;
                _ = self.token.cancelled() => return self.abort(job_id),
                response = self.source.status(job_id) => response,
            };

            let status = match response {
                Ok(Some(status)) => status,
                Ok(None) => continue,
                Err(err) => {
                    courier_warn!("Lost track of job {}: {}", job_id, err);
                    JobStatus::Failed {
                        reason: FailureReason::Polling(err.reason()),
                    }
                }
            };

            if let Some(previous) = &last {
                if !previous.can_transition_to(&status) {
                    courier_debug!(
                        "Ignoring out-of-order status for job {}: {:?} after {:?}",
                        job_id,
                        status,
                        previous
                    );
                    continue;
                }
            }

            let outcome = match &status {
                JobStatus::Completed { details } => Some(PollOutcome::Completed(details.clone())),
                JobStatus::Failed { reason } => Some(PollOutcome::Failed(reason.clone())),
                JobStatus::Queued | JobStatus::Processing { .. } => None,
            };

            match outcome {
                Some(outcome) => {
                    let terminal = match &outcome {
                        PollOutcome::Completed(_) => PollerState::Completed,
                        _ => PollerState::Failed,
                    };
                    self.state.send_replace(terminal);
                    courier_info!("Job {} finished: {:?}", job_id, terminal);
                    on_update(status);
                    return outcome;
                }
                None => {
                    on_update(status.clone());
                    last = Some(status);
                }
            }
        }
    }

    fn abort(&self, job_id: &JobId) -> PollOutcome {
        courier_debug!("Polling of job {} stopped", job_id);
        self.state.send_replace(PollerState::Aborted);
        PollOutcome::Aborted
    }
}
