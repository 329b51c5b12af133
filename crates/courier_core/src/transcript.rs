use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

static CITATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[(\d+)\]").unwrap());

/// A document the query service drew on for an answer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Source {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub publication_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Inline `[n]` markers in `text`, in order of appearance.
pub fn citation_markers(text: &str) -> Vec<usize> {
    CITATION
        .captures_iter(text)
        .filter_map(|caps| caps.get(1)?.as_str().parse().ok())
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionTurn {
    pub query: String,
    pub response: String,
    /// `sources[i]` backs citation marker `[i + 1]`.
    pub sources: Vec<Source>,
    pub timestamp: DateTime<Utc>,
}

impl SessionTurn {
    pub fn source_for(&self, marker: usize) -> Option<&Source> {
        marker.checked_sub(1).and_then(|idx| self.sources.get(idx))
    }

    /// Markers in the response that have no matching source. Reported for
    /// the renderer, never enforced.
    pub fn dangling_citations(&self) -> Vec<usize> {
        let mut dangling: Vec<usize> = citation_markers(&self.response)
            .into_iter()
            .filter(|marker| self.source_for(*marker).is_none())
            .collect();
        dangling.dedup();
        dangling
    }
}

/// Append-only record of completed turns until cleared.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    turns: Vec<SessionTurn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: SessionTurn) {
        self.turns.push(turn);
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn turns(&self) -> &[SessionTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&SessionTurn> {
        self.turns.last()
    }
}
