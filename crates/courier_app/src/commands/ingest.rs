use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use courier_core::{CompletionDetails, ItemRef, Metadata, WorkItem};
use courier_engine::{
    BatchQueueProcessor, ChannelProgressSink, EngineEvent, FormDefaults, IngestionClient,
    JobRunner, MetadataResolver, ProgressSink,
};
use courier_logging::{courier_info, courier_warn};
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::cli::MetadataArgs;
use crate::config::AppConfig;
use crate::render::{outcome_line, ProgressRenderer};

pub(super) async fn ingest_files(
    config: &AppConfig,
    files: Vec<PathBuf>,
    domain: String,
    metadata: MetadataArgs,
) -> anyhow::Result<()> {
    let single = files.len() == 1;
    if !single && metadata.title.is_some() {
        courier_warn!("--title is ignored for batches; titles come from file names");
    }
    let base = metadata.into_metadata();
    let items = files
        .iter()
        .map(|path| read_item(path, &domain, &base, single))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let client = Arc::new(IngestionClient::new(config.client.clone())?);
    let runner = JobRunner::for_client(client);

    match <[WorkItem; 1]>::try_from(items) {
        Ok([item]) => {
            let item = with_form_defaults(item, &FormDefaults::today());
            run_single(config, &runner, item).await
        }
        Err(items) => run_batch(config, runner, items).await,
    }
}

pub(super) async fn ingest_text(
    config: &AppConfig,
    domain: String,
    text: Option<String>,
    metadata: MetadataArgs,
) -> anyhow::Result<()> {
    let metadata = metadata.into_metadata();
    if !metadata.has_required_fields() {
        anyhow::bail!("text uploads need --title, --author and --date");
    }
    NaiveDate::parse_from_str(metadata.publication_date.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid --date '{}'", metadata.publication_date))?;

    let text = match text {
        Some(text) => text,
        None => {
            let mut buffer = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buffer)
                .await
                .context("reading text from stdin")?;
            buffer
        }
    };
    if text.trim().is_empty() {
        anyhow::bail!("no text to upload");
    }

    let client = Arc::new(IngestionClient::new(config.client.clone())?);
    let runner = JobRunner::for_client(client);
    run_single(config, &runner, WorkItem::text(text, domain, metadata)).await
}

fn read_item(
    path: &Path,
    domain: &str,
    base: &Metadata,
    keep_title: bool,
) -> anyhow::Result<WorkItem> {
    let bytes =
        std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(ToOwned::to_owned)
        .with_context(|| format!("{} is not a file name", path.display()))?;
    let mut metadata = base.clone();
    if !keep_title {
        metadata.title.clear();
    }
    Ok(WorkItem::file(name, bytes, domain, metadata))
}

/// One item, errors reported as they are.
async fn run_single(config: &AppConfig, runner: &JobRunner, item: WorkItem) -> anyhow::Result<()> {
    let (sink, renderer) = spawn_renderer(config);
    sink.emit(EngineEvent::ItemStarted {
        item: ItemRef::new(0, &item),
        size: item.size(),
        position: 1,
        total: 1,
    });

    let cancel = CancellationToken::new();
    let interrupt = cancel_on_ctrl_c(cancel.clone());
    let result = runner.run_until(&item, Arc::clone(&sink), &cancel).await;
    interrupt.abort();
    drop(sink);
    let _ = renderer.await;

    let details = result.with_context(|| format!("ingesting {}", item.name()))?;
    println!("{}", completion_line(item.name(), &details));
    Ok(())
}

async fn run_batch(
    config: &AppConfig,
    runner: JobRunner,
    items: Vec<WorkItem>,
) -> anyhow::Result<()> {
    let (sink, renderer) = spawn_renderer(config);
    let processor = BatchQueueProcessor::new(runner);
    let interrupt = cancel_on_ctrl_c(processor.cancel_token());

    let report = processor.run(items, sink).await;
    interrupt.abort();
    let _ = renderer.await;

    println!("{}", report.summary());
    for outcome in &report.skipped {
        println!("  {}", outcome_line(outcome));
    }
    if !report.skipped.is_empty() {
        anyhow::bail!("{} of {} items skipped", report.skipped.len(), report.total());
    }
    Ok(())
}

/// Fill the blanks of a single upload before it is sent.
fn with_form_defaults(item: WorkItem, defaults: &FormDefaults) -> WorkItem {
    let metadata = defaults.resolve(&item);
    item.with_metadata(metadata)
}

fn completion_line(name: &str, details: &CompletionDetails) -> String {
    let mut line = format!("Ingested {name}");
    if let Some(title) = details.document_title.as_deref().filter(|t| !t.is_empty()) {
        line.push_str(&format!(" as \"{title}\""));
    }
    if let Some(domain) = &details.domain {
        line.push_str(&format!(" into {domain}"));
    }
    if let Some(chunks) = details.chunks_created {
        line.push_str(&format!(": {chunks} chunks created"));
    }
    line
}

/// Progress events are rendered on their own task until every sender is gone.
fn spawn_renderer(config: &AppConfig) -> (Arc<dyn ProgressSink>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let policy = config.progress;
    let task = tokio::spawn(async move {
        let mut renderer = ProgressRenderer::new(policy);
        while let Some(event) = rx.recv().await {
            renderer.handle(event);
        }
        renderer.finish();
    });
    (Arc::new(ChannelProgressSink::new(tx)), task)
}

fn cancel_on_ctrl_c(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            signal = tokio::signal::ctrl_c() => {
                if signal.is_ok() {
                    courier_info!("Interrupted, cancelling");
                    token.cancel();
                }
            }
        }
    })
}
