//! Point-to-point channel fabric between nodes.
//!
//! Every node owns exactly one [`Inbox`] (single consumer) and a clone of
//! the [`NetworkHandle`], which carries write ends for *all* inboxes.
//! Sending never blocks the sender: in [`DeliveryMode::Reliable`] inboxes
//! are unbounded, in [`DeliveryMode::BestEffort`] a full inbox drops the
//! message. Delivery order is FIFO per sender→receiver edge; nothing is
//! guaranteed across different senders.

mod config;
mod stats;

pub use config::{DeliveryMode, FabricConfig, DEFAULT_INBOX_CAPACITY};
pub use stats::FabricStats;

use crossbeam::channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use pairwise_messages::Message;
use pairwise_types::NodeId;
use std::sync::Arc;
use tracing::debug;

/// Errors surfaced by the fabric.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FabricError {
    /// The inbox channel disconnected while the node was still receiving.
    #[error("inbox for {0} disconnected")]
    Disconnected(NodeId),
}

/// Result of a non-blocking send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The message was enqueued on the target inbox.
    Delivered,
    /// The message was discarded (inbox full or already closed).
    Dropped,
}

impl SendOutcome {
    /// Whether the message reached the target inbox.
    pub fn is_delivered(self) -> bool {
        matches!(self, SendOutcome::Delivered)
    }
}

/// The read end of one node's message queue.
#[derive(Debug)]
pub struct Inbox {
    node: NodeId,
    rx: Receiver<Message>,
}

impl Inbox {
    /// The node this inbox belongs to.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Block until the next message arrives.
    ///
    /// Returns [`FabricError::Disconnected`] once every send handle has been
    /// dropped and the queue is drained.
    pub fn recv(&self) -> Result<Message, FabricError> {
        self.rx
            .recv()
            .map_err(|_| FabricError::Disconnected(self.node))
    }

    /// Non-blocking receive, for tests and draining.
    pub fn try_recv(&self) -> Option<Message> {
        self.rx.try_recv().ok()
    }
}

/// Cloneable unicast send capability covering every node's inbox.
#[derive(Debug, Clone)]
pub struct NetworkHandle {
    mode: DeliveryMode,
    senders: Arc<Vec<Sender<Message>>>,
    stats: Arc<FabricStats>,
}

impl NetworkHandle {
    /// Route a message to its target's inbox without blocking.
    ///
    /// # Panics
    ///
    /// Panics if the target id is outside the fabric.
    pub fn send(&self, msg: Message) -> SendOutcome {
        let sender = &self.senders[msg.target.index()];
        let result = match self.mode {
            // Unbounded queues: send() only fails on disconnect.
            DeliveryMode::Reliable => sender.send(msg).map_err(TrySendError::from),
            DeliveryMode::BestEffort { .. } => sender.try_send(msg),
        };
        match result {
            Ok(()) => {
                self.stats.note_sent();
                SendOutcome::Delivered
            }
            Err(TrySendError::Full(msg)) => {
                self.stats.note_dropped_full();
                debug!(
                    from = %msg.sender,
                    to = %msg.target,
                    kind = msg.kind.as_str(),
                    "inbox full, message dropped"
                );
                SendOutcome::Dropped
            }
            Err(TrySendError::Disconnected(_)) => {
                // Recipient finalized and went away; it will never look.
                self.stats.note_dropped_disconnected();
                SendOutcome::Dropped
            }
        }
    }

    /// Number of nodes wired into this fabric.
    pub fn num_nodes(&self) -> u32 {
        self.senders.len() as u32
    }

    /// Shared delivery counters.
    pub fn stats(&self) -> &FabricStats {
        &self.stats
    }
}

/// The allocated fabric: one inbox per node plus the shared network handle.
#[derive(Debug)]
pub struct Fabric {
    /// Inboxes in node-id order; the coordinator hands one to each engine.
    pub inboxes: Vec<Inbox>,
    /// Write ends for every inbox.
    pub network: NetworkHandle,
}

impl Fabric {
    /// Allocate queues for `num_nodes` nodes.
    pub fn new(num_nodes: u32, config: FabricConfig) -> Self {
        let mut inboxes = Vec::with_capacity(num_nodes as usize);
        let mut senders = Vec::with_capacity(num_nodes as usize);
        for id in 0..num_nodes {
            let (tx, rx) = match config.mode {
                DeliveryMode::Reliable => unbounded(),
                DeliveryMode::BestEffort { capacity } => bounded(capacity),
            };
            senders.push(tx);
            inboxes.push(Inbox {
                node: NodeId(id),
                rx,
            });
        }
        Self {
            inboxes,
            network: NetworkHandle {
                mode: config.mode,
                senders: Arc::new(senders),
                stats: Arc::new(FabricStats::default()),
            },
        }
    }
}
