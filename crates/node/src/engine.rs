//! Blocking engine that drives one matcher over the fabric.

use crate::{Action, Matcher};
use pairwise_fabric::{FabricError, Inbox, NetworkHandle};
use pairwise_messages::Message;
use pairwise_trace::{EventSink, NodePhase, TraceEvent};
use pairwise_types::{NodeId, Outcome};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, trace};

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Uniform artificial delay applied before each send and after each
    /// receive. Purely an instrumentation aid: it spreads concurrent trace
    /// events apart in time so they are distinguishable in a recording.
    /// Zero disables pacing and is the default.
    pub pacing: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pacing: Duration::ZERO,
        }
    }
}

impl EngineConfig {
    /// Config with the given pacing delay.
    pub fn with_pacing(pacing: Duration) -> Self {
        Self { pacing }
    }
}

/// Errors that end an engine before finalization.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The node's inbox disconnected while it was still unpaired.
    #[error("engine for {node} stopped early: {source}")]
    Fabric {
        /// The node whose engine failed.
        node: NodeId,
        #[source]
        source: FabricError,
    },
}

/// One node's protocol execution context.
///
/// Owns the matcher, the node's inbox, a handle to everyone else's inbox,
/// and the injected event sink. [`Engine::run`] consumes the engine and
/// blocks until the node reaches a terminal state.
pub struct Engine {
    matcher: Matcher,
    inbox: Inbox,
    network: NetworkHandle,
    sink: Arc<dyn EventSink>,
    config: EngineConfig,
    last_phase: NodePhase,
}

impl Engine {
    /// Wire up an engine for one node.
    pub fn new(
        matcher: Matcher,
        inbox: Inbox,
        network: NetworkHandle,
        sink: Arc<dyn EventSink>,
        config: EngineConfig,
    ) -> Self {
        debug_assert_eq!(matcher.id(), inbox.node());
        Self {
            matcher,
            inbox,
            network,
            sink,
            config,
            last_phase: NodePhase::Idle,
        }
    }

    /// Drive the node to its final pairing decision.
    ///
    /// Blocks on the inbox between transitions; returns the node's id and
    /// outcome once finalized.
    pub fn run(mut self) -> Result<(NodeId, Outcome), EngineError> {
        let id = self.matcher.id();
        debug!(node = %id, neighbors = self.matcher.active_neighbors().len(), "engine started");

        let actions = self.matcher.begin();
        self.apply(actions);

        while !self.matcher.is_finalized() {
            let msg = self
                .inbox
                .recv()
                .map_err(|source| EngineError::Fabric { node: id, source })?;
            self.pace();
            self.sink.record(TraceEvent::MsgRecv { node: id, msg });
            trace!(node = %id, kind = msg.kind.as_str(), sender = %msg.sender, "received");

            let actions = self.matcher.on_message(&msg);
            self.apply(actions);
        }

        let outcome = self
            .matcher
            .outcome()
            .expect("finalized matcher has an outcome");
        debug!(node = %id, %outcome, "engine finished");
        Ok((id, outcome))
    }

    /// Record what changed, then execute the sends.
    fn apply(&mut self, actions: Vec<Action>) {
        let id = self.matcher.id();

        let phase = self.matcher.role().phase();
        if phase != self.last_phase {
            self.last_phase = phase;
            self.sink.record(TraceEvent::StateChange {
                node: id,
                state: phase,
            });
            trace!(node = %id, state = phase.as_str(), "state change");

            // Finalization happens at most once, so the MATCHED record is
            // tied to the transition into the terminal phase. Singles
            // report their own id, making the MATCHED stream a complete
            // result mapping.
            if phase == NodePhase::Finalized {
                let outcome = self.matcher.outcome().expect("finalized without outcome");
                let partner = outcome.partner().unwrap_or(id);
                self.sink.record(TraceEvent::Matched { node: id, partner });
            }
        }

        for action in actions {
            match action {
                Action::Send { to, kind } => self.send(Message {
                    kind,
                    sender: id,
                    target: to,
                }),
            }
        }
    }

    fn send(&mut self, msg: Message) {
        self.pace();
        if self.network.send(msg).is_delivered() {
            self.sink.record(TraceEvent::MsgSent {
                node: msg.sender,
                msg,
            });
            trace!(node = %msg.sender, kind = msg.kind.as_str(), to = %msg.target, "sent");
        }
    }

    fn pace(&self) {
        if !self.config.pacing.is_zero() {
            thread::sleep(self.config.pacing);
        }
    }
}
