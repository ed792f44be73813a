//! The structured event model consumers see.

use pairwise_messages::Message;
use pairwise_types::NodeId;
use serde::{Deserialize, Serialize};

/// Role labels as they appear in STATE_CHANGE events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodePhase {
    /// Not yet evaluated its neighborhood.
    Idle,
    /// Sent a proposal and waiting for the answer.
    Proposing,
    /// Waiting for someone else's proposal.
    Listening,
    /// Committed to a final pairing result.
    Finalized,
}

impl NodePhase {
    /// Trace/log name for this phase.
    pub fn as_str(self) -> &'static str {
        match self {
            NodePhase::Idle => "IDLE",
            NodePhase::Proposing => "PROPOSING",
            NodePhase::Listening => "LISTENING",
            NodePhase::Finalized => "FINALIZED",
        }
    }
}

/// A single atomic occurrence in a run.
///
/// Consumers may rely on per-node chronological order only; events from
/// different nodes interleave arbitrarily.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TraceEvent {
    /// Topology snapshot, emitted once before any node starts.
    Init {
        nodes: Vec<NodeId>,
        edges: Vec<(NodeId, NodeId)>,
    },
    /// A node moved to a new phase.
    StateChange { node: NodeId, state: NodePhase },
    /// A node's message was accepted by the fabric.
    MsgSent { node: NodeId, msg: Message },
    /// A node consumed a message from its inbox.
    MsgRecv { node: NodeId, msg: Message },
    /// A node finalized. `partner == node` means it finished single, so the
    /// MATCHED stream alone reconstructs the complete result mapping.
    Matched { node: NodeId, partner: NodeId },
}

impl TraceEvent {
    /// The node this event belongs to, if any (INIT is global).
    pub fn node(&self) -> Option<NodeId> {
        match self {
            TraceEvent::Init { .. } => None,
            TraceEvent::StateChange { node, .. }
            | TraceEvent::MsgSent { node, .. }
            | TraceEvent::MsgRecv { node, .. }
            | TraceEvent::Matched { node, .. } => Some(*node),
        }
    }
}

/// A trace event stamped at recorder ingress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recorded {
    /// Nanoseconds since the Unix epoch, assigned on `record()`.
    pub timestamp: u64,
    #[serde(flatten)]
    pub event: TraceEvent,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pairwise_messages::Message;

    #[test]
    fn test_event_tags() {
        let json = serde_json::to_string(&TraceEvent::StateChange {
            node: NodeId(2),
            state: NodePhase::Listening,
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"STATE_CHANGE","node":2,"state":"LISTENING"}"#);

        let json = serde_json::to_string(&TraceEvent::Matched {
            node: NodeId(1),
            partner: NodeId(4),
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"MATCHED","node":1,"partner":4}"#);
    }

    #[test]
    fn test_msg_payload_shape() {
        let json = serde_json::to_string(&TraceEvent::MsgSent {
            node: NodeId(5),
            msg: Message::propose(NodeId(5), NodeId(3)),
        })
        .unwrap();
        assert_eq!(
            json,
            r#"{"type":"MSG_SENT","node":5,"msg":{"type":"PROPOSE","sender":5,"target":3}}"#
        );
    }

    #[test]
    fn test_timestamp_flattens() {
        let recorded = Recorded {
            timestamp: 99,
            event: TraceEvent::Init {
                nodes: vec![NodeId(0)],
                edges: vec![],
            },
        };
        let json = serde_json::to_string(&recorded).unwrap();
        assert_eq!(
            json,
            r#"{"timestamp":99,"type":"INIT","nodes":[0],"edges":[]}"#
        );
    }
}
