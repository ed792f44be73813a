//! Network messages for the matching protocol.
//!
//! Three message kinds drive the whole negotiation. Messages are plain
//! values: once sent they are copied into the recipient's inbox and carry
//! no ownership back to the sender.

use pairwise_types::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The intent of a network message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    /// Ask the target to pair with the sender.
    Propose,
    /// Agree to a received proposal.
    Accept,
    /// Announce that the sender has committed elsewhere.
    Matched,
}

impl MessageKind {
    /// Wire/trace name for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Propose => "PROPOSE",
            MessageKind::Accept => "ACCEPT",
            MessageKind::Matched => "MATCHED",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point-to-point protocol message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// What the sender wants.
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Originating node.
    pub sender: NodeId,
    /// Destination node; the fabric routes on this.
    pub target: NodeId,
}

impl Message {
    /// Build a proposal from `sender` to `target`.
    pub fn propose(sender: NodeId, target: NodeId) -> Self {
        Self {
            kind: MessageKind::Propose,
            sender,
            target,
        }
    }

    /// Build an acceptance from `sender` to `target`.
    pub fn accept(sender: NodeId, target: NodeId) -> Self {
        Self {
            kind: MessageKind::Accept,
            sender,
            target,
        }
    }

    /// Build a matched announcement from `sender` to `target`.
    pub fn matched(sender: NodeId, target: NodeId) -> Self {
        Self {
            kind: MessageKind::Matched,
            sender,
            target,
        }
    }
}
