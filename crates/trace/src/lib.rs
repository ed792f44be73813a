//! Protocol event recording.
//!
//! Nodes report state transitions, sends, receives, and final pairings to
//! an [`EventSink`] they receive at construction. Sinks are pure observers:
//! nothing a sink does may influence a protocol decision.
//!
//! [`JsonRecorder`] is the durable sink: a single writer thread drains an
//! ingress queue and appends events to a JSON array file in arrival order,
//! so concurrent nodes never interleave output.

mod event;
mod recorder;
mod sink;

pub use event::{NodePhase, Recorded, TraceEvent};
pub use recorder::JsonRecorder;
pub use sink::{EventSink, MemorySink, NullSink};
