//! Courier core: IO-free model of ingestion jobs, batch reports, query
//! transcripts, and the progress display state machine.
mod item;
mod msg;
mod progress;
mod report;
mod state;
mod status;
mod transcript;
mod update;
mod view_model;

pub use item::{ItemRef, Metadata, Payload, WorkItem, UNKNOWN_AUTHOR};
pub use msg::Msg;
pub use progress::{
    fuse, transfer_percent, Phase, ProgressPolicy, MIN_ACTIVE_PERCENT, SMALL_PAYLOAD_TRIGGER,
    TRANSFER_CEILING,
};
pub use report::{BatchOutcome, BatchReport, OutcomeClass, OutcomeDetail};
pub use state::{DisplayPhase, ProgressState};
pub use status::{CompletionDetails, FailureReason, JobStatus, GENERIC_FAILURE};
pub use transcript::{citation_markers, SessionTurn, Source, Transcript};
pub use update::update;
pub use view_model::ProgressView;
