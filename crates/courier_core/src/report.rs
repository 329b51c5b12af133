use crate::item::ItemRef;
use crate::status::CompletionDetails;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeClass {
    Success,
    Skipped,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutcomeDetail {
    Completed(CompletionDetails),
    Reason(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub item: ItemRef,
    pub class: OutcomeClass,
    pub detail: OutcomeDetail,
}

impl BatchOutcome {
    pub fn success(item: ItemRef, details: CompletionDetails) -> Self {
        Self {
            item,
            class: OutcomeClass::Success,
            detail: OutcomeDetail::Completed(details),
        }
    }

    pub fn skipped(item: ItemRef, reason: impl Into<String>) -> Self {
        Self {
            item,
            class: OutcomeClass::Skipped,
            detail: OutcomeDetail::Reason(reason.into()),
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match &self.detail {
            OutcomeDetail::Reason(reason) => Some(reason),
            OutcomeDetail::Completed(_) => None,
        }
    }
}

/// Successes and skips of one batch run, each in completion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchReport {
    pub successes: Vec<BatchOutcome>,
    pub skipped: Vec<BatchOutcome>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: BatchOutcome) {
        match outcome.class {
            OutcomeClass::Success => self.successes.push(outcome),
            OutcomeClass::Skipped => self.skipped.push(outcome),
        }
    }

    pub fn total(&self) -> usize {
        self.successes.len() + self.skipped.len()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.successes
            .iter()
            .chain(self.skipped.iter())
            .any(|outcome| outcome.item.index == index)
    }

    pub fn summary(&self) -> String {
        format!(
            "Processed {} files: {} successful, {} skipped.",
            self.total(),
            self.successes.len(),
            self.skipped.len()
        )
    }
}
