use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDate;
use courier_core::{
    CompletionDetails, FailureReason, JobStatus, Metadata, OutcomeClass, WorkItem,
    UNKNOWN_AUTHOR,
};
use courier_engine::{
    BatchQueueProcessor, EngineEvent, FormDefaults, JobHandle, JobId, JobRunner, JobSubmitter,
    NullSink, ProgressSink, StatusSource, TransportError, CANCELLED_REASON,
};
use pretty_assertions::assert_eq;

const INTERVAL: Duration = Duration::from_millis(50);

/// Shared record of what the fakes saw, in order.
#[derive(Default)]
struct Journal(Mutex<Vec<String>>);

impl Journal {
    fn note(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Accepts every item except the ones listed in `refuse`.
struct FakeSubmitter {
    journal: Arc<Journal>,
    refuse: HashMap<String, TransportError>,
    seen_metadata: Mutex<Vec<Metadata>>,
}

#[async_trait::async_trait]
impl JobSubmitter for FakeSubmitter {
    async fn submit(
        &self,
        item: &WorkItem,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<JobHandle, TransportError> {
        self.journal.note(format!("submit {}", item.name()));
        self.seen_metadata
            .lock()
            .unwrap()
            .push(item.metadata().clone());
        if let Some(err) = self.refuse.get(item.name()) {
            return Err(err.clone());
        }
        sink.emit(EngineEvent::TransferComplete);
        Ok(JobHandle::new(JobId::new(item.name())))
    }
}

/// Reports processing once, then the configured terminal status per job.
struct FakeStatus {
    journal: Arc<Journal>,
    failures: HashMap<String, String>,
    hang: bool,
    polled: Mutex<HashMap<String, usize>>,
}

#[async_trait::async_trait]
impl StatusSource for FakeStatus {
    async fn status(&self, job_id: &JobId) -> Result<Option<JobStatus>, TransportError> {
        if self.hang {
            return Ok(None);
        }
        let count = {
            let mut polled = self.polled.lock().unwrap();
            let count = polled.entry(job_id.to_string()).or_default();
            *count += 1;
            *count
        };
        if count == 1 {
            return Ok(Some(JobStatus::Processing {
                stage_percent: 50,
                stage_label: "embedding".to_string(),
            }));
        }
        self.journal.note(format!("finished {job_id}"));
        Ok(Some(match self.failures.get(job_id.as_str()) {
            Some(message) => JobStatus::Failed {
                reason: FailureReason::job(Some(message.clone())),
            },
            None => JobStatus::Completed {
                details: CompletionDetails {
                    document_title: Some(job_id.to_string()),
                    ..CompletionDetails::default()
                },
            },
        }))
    }
}

#[derive(Default)]
struct Events(Mutex<Vec<EngineEvent>>);

impl ProgressSink for Events {
    fn emit(&self, event: EngineEvent) {
        self.0.lock().unwrap().push(event);
    }
}

struct Harness {
    journal: Arc<Journal>,
    submitter: Arc<FakeSubmitter>,
    processor: BatchQueueProcessor,
}

fn harness(
    refuse: &[(&str, TransportError)],
    failures: &[(&str, &str)],
    hang: bool,
) -> Harness {
    courier_logging::initialize_for_tests();
    let journal = Arc::new(Journal::default());
    let submitter = Arc::new(FakeSubmitter {
        journal: Arc::clone(&journal),
        refuse: refuse
            .iter()
            .map(|(name, err)| (name.to_string(), err.clone()))
            .collect(),
        seen_metadata: Mutex::new(Vec::new()),
    });
    let status = Arc::new(FakeStatus {
        journal: Arc::clone(&journal),
        failures: failures
            .iter()
            .map(|(name, message)| (name.to_string(), message.to_string()))
            .collect(),
        hang,
        polled: Mutex::new(HashMap::new()),
    });
    let runner = JobRunner::new(submitter.clone(), status, INTERVAL);
    let today = NaiveDate::from_ymd_opt(2024, 5, 17).unwrap();
    let processor =
        BatchQueueProcessor::new(runner).with_resolver(Arc::new(FormDefaults::new(today)));
    Harness {
        journal,
        submitter,
        processor,
    }
}

fn items(names: &[&str]) -> Vec<WorkItem> {
    names
        .iter()
        .map(|name| WorkItem::file(*name, name.as_bytes().to_vec(), "ai", Metadata::default()))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn failed_upload_is_skipped_and_the_batch_continues() {
    let h = harness(
        &[("b.pdf", TransportError::Network("refused".to_string()))],
        &[],
        false,
    );
    let events = Arc::new(Events::default());

    let report = h
        .processor
        .run(items(&["a.pdf", "b.pdf", "c.pdf"]), events.clone())
        .await;

    let success_indices: Vec<usize> = report.successes.iter().map(|o| o.item.index).collect();
    assert_eq!(success_indices, vec![0, 2]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].item.index, 1);
    assert_eq!(report.skipped[0].class, OutcomeClass::Skipped);
    assert_eq!(report.skipped[0].reason(), Some("Network error"));
    assert_eq!(report.total(), 3);
    assert_eq!(
        report.summary(),
        "Processed 3 files: 2 successful, 1 skipped."
    );

    let finished = events
        .0
        .lock()
        .unwrap()
        .iter()
        .filter(|event| matches!(event, EngineEvent::ItemFinished(_)))
        .count();
    assert_eq!(finished, 3);
}

#[tokio::test(start_paused = true)]
async fn items_run_strictly_one_after_another() {
    let h = harness(&[], &[], false);

    h.processor
        .run(items(&["a.pdf", "b.pdf", "c.pdf"]), Arc::new(NullSink))
        .await;

    assert_eq!(
        h.journal.entries(),
        vec![
            "submit a.pdf",
            "finished a.pdf",
            "submit b.pdf",
            "finished b.pdf",
            "submit c.pdf",
            "finished c.pdf",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn server_side_failure_reason_is_reported() {
    let h = harness(&[], &[("b.pdf", "Could not parse PDF")], false);

    let report = h
        .processor
        .run(items(&["a.pdf", "b.pdf"]), Arc::new(NullSink))
        .await;

    assert_eq!(report.successes.len(), 1);
    assert_eq!(report.skipped[0].reason(), Some("Could not parse PDF"));
}

#[tokio::test(start_paused = true)]
async fn item_started_events_carry_position_and_total() {
    let h = harness(&[], &[], false);
    let events = Arc::new(Events::default());

    h.processor
        .run(items(&["a.pdf", "b.pdf"]), events.clone())
        .await;

    let started: Vec<(usize, usize)> = events
        .0
        .lock()
        .unwrap()
        .iter()
        .filter_map(|event| match event {
            EngineEvent::ItemStarted {
                position, total, ..
            } => Some((*position, *total)),
            _ => None,
        })
        .collect();
    assert_eq!(started, vec![(1, 2), (2, 2)]);
}

#[tokio::test(start_paused = true)]
async fn blank_metadata_gets_form_defaults() {
    let h = harness(&[], &[], false);

    h.processor
        .run(items(&["annual.report.pdf"]), Arc::new(NullSink))
        .await;

    let seen = h.submitter.seen_metadata.lock().unwrap().clone();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].title, "annual");
    assert_eq!(seen[0].author, UNKNOWN_AUTHOR);
    assert_eq!(seen[0].publication_date, "2024-05-17");
}

#[tokio::test(start_paused = true)]
async fn empty_batch_reports_nothing() {
    let h = harness(&[], &[], false);
    let report = h.processor.run(Vec::new(), Arc::new(NullSink)).await;
    assert_eq!(report.total(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancelling_skips_the_current_and_remaining_items() {
    let h = harness(&[], &[], true);
    let cancel = h.processor.cancel_token();

    let batch = tokio::spawn(
        h.processor
            .run(items(&["a.pdf", "b.pdf", "c.pdf"]), Arc::new(Events::default())),
    );
    tokio::time::sleep(INTERVAL * 10).await;
    cancel.cancel();
    let report = batch.await.unwrap();

    assert!(report.successes.is_empty());
    assert_eq!(report.skipped.len(), 3);
    assert!(report
        .skipped
        .iter()
        .all(|outcome| outcome.reason() == Some(CANCELLED_REASON)));
    assert_eq!(h.journal.entries(), vec!["submit a.pdf"]);
}

#[tokio::test(start_paused = true)]
async fn runner_reports_acceptance_before_status_updates() {
    let h = harness(&[], &[], false);
    let events = Arc::new(Events::default());
    let runner = JobRunner::new(
        h.submitter.clone(),
        Arc::new(FakeStatus {
            journal: Arc::clone(&h.journal),
            failures: HashMap::new(),
            hang: false,
            polled: Mutex::new(HashMap::new()),
        }),
        INTERVAL,
    );

    let details = runner
        .run(&items(&["solo.pdf"])[0], events.clone())
        .await
        .expect("job completes");
    assert_eq!(details.document_title.as_deref(), Some("solo.pdf"));

    let kinds: Vec<&str> = events
        .0
        .lock()
        .unwrap()
        .iter()
        .map(|event| match event {
            EngineEvent::TransferComplete => "transfer-complete",
            EngineEvent::JobAccepted { .. } => "accepted",
            EngineEvent::Status(JobStatus::Processing { .. }) => "processing",
            EngineEvent::Status(JobStatus::Completed { .. }) => "completed",
            _ => "other",
        })
        .collect();
    assert_eq!(
        kinds,
        vec!["transfer-complete", "accepted", "processing", "completed"]
    );
}
