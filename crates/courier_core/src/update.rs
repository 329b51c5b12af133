use crate::progress::{transfer_percent, Phase, MIN_ACTIVE_PERCENT, TRANSFER_CEILING};
use crate::state::DisplayPhase;
use crate::{JobStatus, Msg, ProgressState};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Pure update function: applies a message to the progress display.
pub fn update(mut state: ProgressState, msg: Msg) -> ProgressState {
    match msg {
        Msg::Started { name, size } => {
            state.reset_for(name, size);
            state.pin_percent(MIN_ACTIVE_PERCENT);
            match size {
                Some(bytes) => state.set_message(format!(
                    "Uploading document ({:.2} MB)...",
                    bytes as f64 / BYTES_PER_MB
                )),
                None => state.set_message("Preparing to upload document..."),
            }
        }
        Msg::TransferProgress { sent, total } => {
            if state.phase != DisplayPhase::Transferring {
                return state;
            }
            match transfer_percent(sent, total) {
                Some(raw) => {
                    let hint = state.size_hint.or(total);
                    let display = state.policy.fuse(Phase::Transfer, raw, hint);
                    state.raise_percent(display);
                    state.set_message(format!(
                        "Uploading document... {}%",
                        raw.max(MIN_ACTIVE_PERCENT)
                    ));
                }
                None => state.set_message("Uploading document... (size unknown)"),
            }
        }
        Msg::TransferComplete => {
            if state.phase == DisplayPhase::Transferring {
                state.set_phase(DisplayPhase::AwaitingServer);
                state.pin_percent(TRANSFER_CEILING);
                state.set_message("Upload complete, waiting for server response...");
            }
        }
        Msg::JobAccepted { job_id } => {
            if state.is_finished() {
                return state;
            }
            state.set_job_id(job_id);
            state.set_phase(DisplayPhase::Processing);
            state.raise_percent(TRANSFER_CEILING);
            state.set_message("Upload complete. Processing document...");
        }
        Msg::Status(status) => apply_status(&mut state, status),
        Msg::TransportFailed { reason } => {
            if !state.is_finished() {
                state.set_phase(DisplayPhase::Failed);
                state.set_message(format!("Upload failed: {reason}"));
            }
        }
    }
    state
}

fn apply_status(state: &mut ProgressState, status: JobStatus) {
    // A terminal display never changes again until the next Started.
    if state.is_finished() {
        return;
    }
    match status {
        JobStatus::Queued => {
            state.set_phase(DisplayPhase::Processing);
            state.raise_percent(TRANSFER_CEILING);
            state.set_message("Waiting for the server to start processing...");
        }
        JobStatus::Processing {
            stage_percent,
            stage_label,
        } => {
            state.set_phase(DisplayPhase::Processing);
            let display = state.policy.fuse(Phase::Processing, stage_percent, None);
            state.raise_percent(display);
            state.set_message(format!("Processing: {stage_label}..."));
        }
        JobStatus::Completed { .. } => {
            state.set_phase(DisplayPhase::Completed);
            state.raise_percent(100);
            state.set_message("Processing complete!");
        }
        JobStatus::Failed { reason } => {
            state.set_phase(DisplayPhase::Failed);
            state.set_message(format!("Processing failed: {reason}"));
        }
    }
}
