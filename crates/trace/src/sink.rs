//! Event sinks.
//!
//! A sink is a one-way emission capability injected into each engine at
//! construction. The protocol never depends on what a sink does with an
//! event, only that `record` returns promptly.

use crate::TraceEvent;
use pairwise_types::NodeId;
use std::sync::Mutex;

/// One-way event emission capability.
pub trait EventSink: Send + Sync {
    /// Accept one event. Must not block the caller on downstream I/O.
    fn record(&self, event: TraceEvent);
}

/// Discards every event. The default sink for headless runs and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&self, _event: TraceEvent) {}
}

/// Buffers events in memory, in arrival order. Test sink.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<TraceEvent>>,
}

impl MemorySink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.lock().expect("sink poisoned").clone()
    }

    /// Events attributed to one node, in arrival order.
    pub fn events_for(&self, node: NodeId) -> Vec<TraceEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.node() == Some(node))
            .collect()
    }
}

impl EventSink for MemorySink {
    fn record(&self, event: TraceEvent) {
        self.events.lock().expect("sink poisoned").push(event);
    }
}
