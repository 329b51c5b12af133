use crate::state::DisplayPhase;

/// Snapshot handed to whatever renders the progress display.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressView {
    pub item_name: Option<String>,
    pub phase: DisplayPhase,
    pub percent: u8,
    pub message: String,
    pub job_id: Option<String>,
    pub dirty: bool,
}
