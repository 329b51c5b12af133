use tokio::sync::mpsc;

use crate::EngineEvent;

/// Receives engine events as they happen, independent of how the
/// operation that produced them eventually resolves.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

/// Forwards events into an unbounded channel; a dropped receiver is ignored.
pub struct ChannelProgressSink {
    tx: mpsc::UnboundedSender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::UnboundedSender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _event: EngineEvent) {}
}
