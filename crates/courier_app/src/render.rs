//! Terminal presentation: the progress bar driven by the core display
//! state machine, and answer formatting.

use courier_core::{
    update, BatchOutcome, Msg, OutcomeClass, ProgressPolicy, ProgressState, SessionTurn,
};
use courier_engine::EngineEvent;
use indicatif::{ProgressBar, ProgressStyle};

const BAR_TEMPLATE: &str = "{prefix} [{bar:40.cyan/blue}] {pos:>3}% {wide_msg}";

/// Engine events that affect the display, as display messages.
pub fn to_msg(event: &EngineEvent) -> Option<Msg> {
    match event {
        EngineEvent::ItemStarted { item, size, .. } => Some(Msg::Started {
            name: item.name.clone(),
            size: Some(*size),
        }),
        EngineEvent::Transfer { sent, total } => Some(Msg::TransferProgress {
            sent: *sent,
            total: *total,
        }),
        EngineEvent::TransferComplete => Some(Msg::TransferComplete),
        EngineEvent::JobAccepted { job_id } => Some(Msg::JobAccepted {
            job_id: job_id.to_string(),
        }),
        EngineEvent::Status(status) => Some(Msg::Status(status.clone())),
        EngineEvent::ItemFinished(outcome) => outcome.reason().map(|reason| Msg::TransportFailed {
            reason: reason.to_string(),
        }),
    }
}

pub struct ProgressRenderer {
    state: ProgressState,
    bar: ProgressBar,
}

impl ProgressRenderer {
    pub fn new(policy: ProgressPolicy) -> Self {
        Self::with_bar(policy, ProgressBar::new(100))
    }

    #[cfg(test)]
    pub fn hidden(policy: ProgressPolicy) -> Self {
        Self::with_bar(policy, ProgressBar::hidden())
    }

    fn with_bar(policy: ProgressPolicy, bar: ProgressBar) -> Self {
        if let Ok(style) = ProgressStyle::default_bar().template(BAR_TEMPLATE) {
            bar.set_style(style.progress_chars("#>-"));
        }
        Self {
            state: ProgressState::with_policy(policy),
            bar,
        }
    }

    pub fn handle(&mut self, event: EngineEvent) {
        if let EngineEvent::ItemStarted {
            position, total, ..
        } = &event
        {
            if *total > 1 {
                self.bar.set_prefix(format!("[{position}/{total}]"));
            }
        }

        if let Some(msg) = to_msg(&event) {
            self.state = update(std::mem::take(&mut self.state), msg);
            if self.state.consume_dirty() {
                let view = self.state.view();
                self.bar.set_position(u64::from(view.percent));
                self.bar.set_message(view.message);
            }
        }

        if let EngineEvent::ItemFinished(outcome) = &event {
            self.bar.println(outcome_line(outcome));
        }
    }

    #[cfg(test)]
    pub fn phase(&self) -> courier_core::DisplayPhase {
        self.state.view().phase
    }

    pub fn finish(self) {
        let message = self.state.view().message;
        self.bar.finish_with_message(message);
    }
}

pub fn outcome_line(outcome: &BatchOutcome) -> String {
    match (outcome.class, outcome.reason()) {
        (OutcomeClass::Success, _) => format!("ok      {}", outcome.item.name),
        (OutcomeClass::Skipped, reason) => format!(
            "skipped {}: {}",
            outcome.item.name,
            reason.unwrap_or_default()
        ),
    }
}

/// Answer text followed by a numbered source list.
pub fn format_turn(turn: &SessionTurn) -> String {
    let mut out = turn.response.trim_end().to_string();
    if turn.sources.is_empty() {
        return out;
    }
    out.push_str("\n\nSources:");
    for (index, source) in turn.sources.iter().enumerate() {
        out.push_str(&format!("\n  [{}] {}", index + 1, source.title));
        if !source.author.is_empty() {
            out.push_str(&format!(", {}", source.author));
        }
        if !source.publication_date.is_empty() {
            out.push_str(&format!(" ({})", source.publication_date));
        }
        if let Some(url) = &source.url {
            out.push_str(&format!(" <{url}>"));
        }
    }
    out
}
