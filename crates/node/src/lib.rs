//! Node protocol engine for distributed maximal matching.
//!
//! Each node runs a greedy local-maximum protocol: while unpaired, it
//! either proposes to the largest id left in its active neighbor set (when
//! it outranks that id) or listens for a proposal. Matched announcements
//! prune the active set and trigger re-evaluation, which is the protocol's
//! entire liveness mechanism: eventually every node pairs up or runs out
//! of neighbors and finishes single.
//!
//! The split follows the workspace-wide pattern:
//!
//! - [`Matcher`] is the pure state machine (events in, actions out)
//! - [`Engine`] owns the I/O: it blocks on the inbox, executes sends, and
//!   reports to the injected [`pairwise_trace::EventSink`]

mod engine;
mod machine;

pub use engine::{Engine, EngineConfig, EngineError};
pub use machine::{Action, Matcher, Role};
