use crate::view_model::ProgressView;
use crate::ProgressPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayPhase {
    #[default]
    Idle,
    Transferring,
    AwaitingServer,
    Processing,
    Completed,
    Failed,
}

/// Display state for the one job currently shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressState {
    pub(crate) policy: ProgressPolicy,
    pub(crate) phase: DisplayPhase,
    pub(crate) percent: u8,
    pub(crate) message: String,
    pub(crate) item_name: Option<String>,
    pub(crate) size_hint: Option<u64>,
    pub(crate) job_id: Option<String>,
    dirty: bool,
}

impl ProgressState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: ProgressPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn view(&self) -> ProgressView {
        ProgressView {
            item_name: self.item_name.clone(),
            phase: self.phase,
            percent: self.percent,
            message: self.message.clone(),
            job_id: self.job_id.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn reset_for(&mut self, name: String, size: Option<u64>) {
        let policy = self.policy;
        *self = Self {
            policy,
            item_name: Some(name),
            size_hint: size,
            phase: DisplayPhase::Transferring,
            ..Self::default()
        };
        self.dirty = true;
    }

    /// Raise the shown percentage; lower values are ignored.
    pub(crate) fn raise_percent(&mut self, percent: u8) {
        let percent = percent.min(100);
        if percent > self.percent {
            self.percent = percent;
            self.dirty = true;
        }
    }

    /// Set the shown percentage exactly, ignoring earlier values.
    pub(crate) fn pin_percent(&mut self, percent: u8) {
        if self.percent != percent {
            self.percent = percent.min(100);
            self.dirty = true;
        }
    }

    pub(crate) fn set_phase(&mut self, phase: DisplayPhase) {
        if self.phase != phase {
            self.phase = phase;
            self.dirty = true;
        }
    }

    pub(crate) fn set_message(&mut self, message: impl Into<String>) {
        let message = message.into();
        if self.message != message {
            self.message = message;
            self.dirty = true;
        }
    }

    pub(crate) fn set_job_id(&mut self, job_id: String) {
        self.job_id = Some(job_id);
        self.dirty = true;
    }

    pub(crate) fn is_finished(&self) -> bool {
        matches!(self.phase, DisplayPhase::Completed | DisplayPhase::Failed)
    }
}
