//! Courier engine: talks to the ingestion and query services, polls jobs
//! and drains upload batches.
mod batch;
mod client;
mod poll;
mod query;
mod runner;
mod settings;
mod sink;
mod submit;
mod types;
mod wire;

pub use batch::{BatchQueueProcessor, FormDefaults, MetadataResolver, CANCELLED_REASON};
pub use client::IngestionClient;
pub use poll::{PollOutcome, PollStopper, PollerHandle, PollerState, StatusPoller, StatusSource};
pub use query::{
    normalize_domain, AskOutcome, OrchestratorClient, QueryError, QueryService, QuerySession,
    ALL_DOMAINS,
};
pub use runner::JobRunner;
pub use settings::ClientSettings;
pub use sink::{ChannelProgressSink, NullSink, ProgressSink};
pub use submit::JobSubmitter;
pub use types::{EngineEvent, JobError, JobHandle, JobId, TransportError};
pub use wire::{parse_status, Domain, QueryAnswer, QueryRequest, SupportedFileType};
