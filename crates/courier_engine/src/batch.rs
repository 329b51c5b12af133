use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use courier_core::{BatchOutcome, BatchReport, ItemRef, Metadata, WorkItem};
use courier_logging::{courier_info, courier_warn};
use tokio_util::sync::CancellationToken;

use crate::{EngineEvent, JobError, JobRunner, ProgressSink};

pub const CANCELLED_REASON: &str = "Batch cancelled";

/// Supplies an item's metadata right before it is submitted.
pub trait MetadataResolver: Send + Sync {
    fn resolve(&self, item: &WorkItem) -> Metadata;
}

/// Fills blank fields with the upload form's defaults.
#[derive(Debug, Clone, Copy)]
pub struct FormDefaults {
    today: NaiveDate,
}

impl FormDefaults {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn today() -> Self {
        Self::new(Local::now().date_naive())
    }
}

impl MetadataResolver for FormDefaults {
    fn resolve(&self, item: &WorkItem) -> Metadata {
        item.metadata()
            .clone()
            .with_defaults(item.name(), self.today)
    }
}

/// Drains a queue of items strictly one at a time.
///
/// Item `n + 1` is not submitted until item `n` has reached a terminal
/// outcome, and every item ends up in exactly one half of the report.
pub struct BatchQueueProcessor {
    runner: JobRunner,
    resolver: Arc<dyn MetadataResolver>,
    cancel: CancellationToken,
}

impl BatchQueueProcessor {
    pub fn new(runner: JobRunner) -> Self {
        Self {
            runner,
            resolver: Arc::new(FormDefaults::today()),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn MetadataResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Cancelling stops the in-flight job's poller and skips everything
    /// still queued.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn run(self, items: Vec<WorkItem>, sink: Arc<dyn ProgressSink>) -> BatchReport {
        let total = items.len();
        let mut queue: VecDeque<(usize, WorkItem)> = items.into_iter().enumerate().collect();
        let mut report = BatchReport::new();
        courier_info!("Starting batch of {} items", total);

        while let Some((index, item)) = queue.pop_front() {
            let item_ref = ItemRef::new(index, &item);
            let outcome = if self.cancel.is_cancelled() {
                BatchOutcome::skipped(item_ref, CANCELLED_REASON)
            } else {
                let metadata = self.resolver.resolve(&item);
                let item = item.with_metadata(metadata);
                sink.emit(EngineEvent::ItemStarted {
                    item: item_ref.clone(),
                    size: item.size(),
                    position: index + 1,
                    total,
                });
                match self
                    .runner
                    .run_until(&item, Arc::clone(&sink), &self.cancel)
                    .await
                {
                    Ok(details) => BatchOutcome::success(item_ref, details),
                    Err(err) => {
                        let reason = skip_reason(&err);
                        courier_warn!("Skipping {}: {}", item.name(), err);
                        BatchOutcome::skipped(item_ref, reason)
                    }
                }
            };
            sink.emit(EngineEvent::ItemFinished(outcome.clone()));
            report.record(outcome);
        }

        courier_info!("{}", report.summary());
        report
    }
}

fn skip_reason(err: &JobError) -> String {
    match err {
        JobError::Transport(err) => err.reason(),
        JobError::Failed(reason) => reason.to_string(),
        JobError::Aborted => CANCELLED_REASON.to_string(),
    }
}
