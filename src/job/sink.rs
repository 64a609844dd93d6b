//! Event sinks
//!
//! The orchestrator writes progress through a `ProgressSink`; transports
//! drain events on their side of the seam. `emit` returning false tells the
//! orchestrator its listener is gone: the in-flight fold still completes,
//! nothing further gets scheduled.

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::events::ProgressEvent;

pub trait ProgressSink {
    /// Deliver one event. Returns false once no listener remains.
    fn emit(&self, event: ProgressEvent) -> bool;
}

/// Discards everything, for callers that only want the returned result
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _event: ProgressEvent) -> bool {
        true
    }
}

/// Buffers events in memory, in emission order
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain everything captured so far
    pub fn take(&self) -> Vec<ProgressEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn snapshot(&self) -> Vec<ProgressEvent> {
        self.events.lock().clone()
    }
}

impl ProgressSink for MemorySink {
    fn emit(&self, event: ProgressEvent) -> bool {
        self.events.lock().push(event);
        true
    }
}

/// Forwards events into an unbounded channel. Sends start failing once the
/// receiving half is dropped or closed, which is how streaming consumers
/// cancel a running job.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelSink {
    fn emit(&self, event: ProgressEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}
