//! The coordinator: wiring, spawning, joining, verifying.

use crate::{verify, SimulationConfig, VerificationReport};
use pairwise_fabric::{Fabric, FabricConfig};
use pairwise_node::{Engine, EngineError, Matcher};
use pairwise_trace::{EventSink, NullSink, TraceEvent};
use pairwise_types::{NodeId, Outcome, Topology};
use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;
use std::thread;
use tracing::{debug, info};

/// Errors that abort a simulation run.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// An engine returned an error instead of a result.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// An engine thread panicked, which indicates a protocol violation.
    #[error("engine thread for {0} panicked")]
    NodePanicked(NodeId),

    /// The OS refused to spawn an engine thread.
    #[error("failed to spawn engine thread")]
    Spawn(#[from] io::Error),
}

/// Everything a finished run produced.
#[derive(Debug)]
pub struct RunReport {
    /// Final pairing result per node.
    pub outcomes: BTreeMap<NodeId, Outcome>,
    /// Invariant checks over the outcomes.
    pub verification: VerificationReport,
    /// Messages accepted by the fabric.
    pub messages_sent: u64,
    /// Messages dropped on full inboxes (best-effort loss).
    pub messages_dropped_full: u64,
    /// Messages discarded because the recipient had already finalized and
    /// closed its inbox. Benign: the recipient will never look.
    pub messages_dropped_disconnected: u64,
}

impl RunReport {
    /// Nodes that finished with a partner, as sorted `(low, high)` pairs.
    pub fn pairs(&self) -> Vec<(NodeId, NodeId)> {
        self.outcomes
            .iter()
            .filter_map(|(&node, outcome)| outcome.partner().map(|peer| (node, peer)))
            .filter(|&(node, peer)| node < peer)
            .collect()
    }

    /// Nodes that finished single, in id order.
    pub fn singles(&self) -> Vec<NodeId> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_single())
            .map(|(&node, _)| node)
            .collect()
    }
}

/// One configured simulation over a fixed topology.
///
/// Spawns one OS thread per node, each running an independent
/// [`Engine`]; all coordination between them is message passing over the
/// fabric. `run` blocks until every engine reaches a terminal state, then
/// verifies the combined result.
pub struct Simulation {
    topology: Topology,
    config: SimulationConfig,
    sink: Arc<dyn EventSink>,
}

impl Simulation {
    /// Simulation with a no-op sink.
    pub fn new(topology: Topology, config: SimulationConfig) -> Self {
        Self {
            topology,
            config,
            sink: Arc::new(NullSink),
        }
    }

    /// Attach an event sink shared by every engine.
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Run the protocol to completion and verify the outcome.
    pub fn run(self) -> Result<RunReport, SimulationError> {
        let num_nodes = self.topology.num_nodes();
        info!(
            num_nodes,
            num_edges = self.topology.num_edges(),
            delivery = ?self.config.delivery,
            "starting matching run"
        );

        self.sink.record(TraceEvent::Init {
            nodes: self.topology.node_ids().collect(),
            edges: self.topology.edges(),
        });

        let Fabric { inboxes, network } =
            Fabric::new(num_nodes, FabricConfig::with_mode(self.config.delivery));

        let mut handles = Vec::with_capacity(num_nodes as usize);
        for inbox in inboxes {
            let id = inbox.node();
            let matcher = Matcher::new(id, self.topology.neighbors(id).iter().copied());
            let engine = Engine::new(
                matcher,
                inbox,
                network.clone(),
                Arc::clone(&self.sink),
                self.config.engine.clone(),
            );
            let handle = thread::Builder::new()
                .name(format!("node-{}", id.0))
                .spawn(move || engine.run())?;
            handles.push((id, handle));
        }

        let mut outcomes = BTreeMap::new();
        for (id, handle) in handles {
            let (node, outcome) = handle
                .join()
                .map_err(|_| SimulationError::NodePanicked(id))??;
            debug!(%node, %outcome, "engine joined");
            outcomes.insert(node, outcome);
        }

        let verification = verify(&self.topology, &outcomes);
        let stats = network.stats();
        info!(
            passed = verification.passed(),
            pairs = outcomes.values().filter(|o| !o.is_single()).count() / 2,
            singles = outcomes.values().filter(|o| o.is_single()).count(),
            messages_sent = stats.sent(),
            messages_dropped = stats.dropped(),
            "matching run complete"
        );

        Ok(RunReport {
            outcomes,
            verification,
            messages_sent: stats.sent(),
            messages_dropped_full: stats.dropped_full(),
            messages_dropped_disconnected: stats.dropped_disconnected(),
        })
    }
}
