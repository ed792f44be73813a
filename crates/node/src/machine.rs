//! The matching state machine.
//!
//! [`Matcher`] is synchronous, deterministic, and performs no I/O: it
//! mutates its own private state and returns [`Action`]s for the engine to
//! execute. Every (role, message kind) combination is an explicit
//! transition arm below; combinations the protocol cannot produce are
//! fatal invariant failures rather than silent fallthrough.

use pairwise_messages::{Message, MessageKind};
use pairwise_trace::NodePhase;
use pairwise_types::{NodeId, Outcome};
use std::collections::BTreeSet;

/// Where a node currently stands in the negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Created but not yet evaluated its neighborhood.
    Idle,
    /// Sent a proposal to `target` and waiting for it to resolve.
    Proposing {
        /// The neighbor the outstanding proposal went to.
        target: NodeId,
    },
    /// Waiting for a neighbor's proposal.
    Listening,
    /// Holds a permanent pairing result; the engine exits.
    Finalized,
}

impl Role {
    /// The phase label recorded in trace streams.
    pub fn phase(&self) -> NodePhase {
        match self {
            Role::Idle => NodePhase::Idle,
            Role::Proposing { .. } => NodePhase::Proposing,
            Role::Listening => NodePhase::Listening,
            Role::Finalized => NodePhase::Finalized,
        }
    }

    /// Whether the node has committed to a result.
    pub fn is_finalized(&self) -> bool {
        matches!(self, Role::Finalized)
    }
}

/// Commands the matcher wants the engine to perform.
///
/// Actions are executed in order; the matcher has already transitioned by
/// the time they are returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Send a message to another node.
    Send {
        /// Destination node.
        to: NodeId,
        /// Message kind to send.
        kind: MessageKind,
    },
}

/// Per-node matching state machine.
///
/// Owned exclusively by one engine; no other node can observe or mutate it
/// except through messages.
#[derive(Debug)]
pub struct Matcher {
    id: NodeId,
    /// Neighbors still believed unmatched. Shrinks monotonically.
    active: BTreeSet<NodeId>,
    role: Role,
    /// Set exactly once; own id encodes "single".
    partner: Option<NodeId>,
}

impl Matcher {
    /// Create a matcher for `id` with its initial graph neighborhood.
    pub fn new(id: NodeId, neighbors: impl IntoIterator<Item = NodeId>) -> Self {
        let active: BTreeSet<NodeId> = neighbors.into_iter().collect();
        debug_assert!(!active.contains(&id), "{id} listed as its own neighbor");
        Self {
            id,
            active,
            role: Role::Idle,
            partner: None,
        }
    }

    /// This node's id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Current role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Neighbors still considered available.
    pub fn active_neighbors(&self) -> &BTreeSet<NodeId> {
        &self.active
    }

    /// The final result, once finalized.
    pub fn outcome(&self) -> Option<Outcome> {
        self.partner
            .map(|partner| Outcome::from_partner(self.id, partner))
    }

    /// Whether the negotiation is over for this node.
    pub fn is_finalized(&self) -> bool {
        self.role.is_finalized()
    }

    /// Start the negotiation. Must be called exactly once, before any
    /// message is delivered.
    pub fn begin(&mut self) -> Vec<Action> {
        assert_eq!(self.role, Role::Idle, "{} began twice", self.id);
        self.evaluate()
    }

    /// Feed one inbox message through the transition table.
    pub fn on_message(&mut self, msg: &Message) -> Vec<Action> {
        debug_assert_eq!(msg.target, self.id, "misrouted message");
        match self.role {
            Role::Proposing { target } => self.on_message_proposing(target, msg),
            Role::Listening => self.on_message_listening(msg),
            // The engine stops delivering once finalized, and delivers
            // nothing before begin(); reaching here is a logic defect.
            Role::Idle | Role::Finalized => panic!(
                "{}: {} from {} delivered in role {:?}",
                self.id, msg.kind, msg.sender, self.role
            ),
        }
    }

    /// Re-derive the role from the current neighborhood.
    ///
    /// Entered from Idle and again after every pruning that unblocks the
    /// node. Symmetry breaking: a node proposes exactly when its own id
    /// beats the largest id still in its active set.
    fn evaluate(&mut self) -> Vec<Action> {
        debug_assert!(self.partner.is_none());
        match self.active.last().copied() {
            None => self.finalize(self.id),
            Some(max) if self.id > max => {
                self.role = Role::Proposing { target: max };
                vec![Action::Send {
                    to: max,
                    kind: MessageKind::Propose,
                }]
            }
            Some(_) => {
                self.role = Role::Listening;
                Vec::new()
            }
        }
    }

    fn on_message_proposing(&mut self, target: NodeId, msg: &Message) -> Vec<Action> {
        match msg.kind {
            // The answer we were waiting for.
            MessageKind::Accept if msg.sender == target => self.finalize(target),
            // An acceptance from anyone else is stale; nothing to resolve.
            MessageKind::Accept => Vec::new(),
            // Simultaneous cross-proposal: both endpoints name each other,
            // so both finalize without a further round trip.
            MessageKind::Propose if msg.sender == target => self.finalize(target),
            // Stray proposal while our own is outstanding. Ignored: the
            // sender re-evaluates on its own once it learns our fate.
            MessageKind::Propose => Vec::new(),
            MessageKind::Matched => {
                self.active.remove(&msg.sender);
                if msg.sender == target {
                    // Our target committed elsewhere; pick a new maximum.
                    self.evaluate()
                } else {
                    Vec::new()
                }
            }
        }
    }

    fn on_message_listening(&mut self, msg: &Message) -> Vec<Action> {
        match msg.kind {
            // Greedy: the first proposal received while unpaired wins.
            MessageKind::Propose => {
                debug_assert!(
                    self.active.contains(&msg.sender),
                    "{}: proposal from pruned neighbor {}",
                    self.id,
                    msg.sender
                );
                let mut actions = vec![Action::Send {
                    to: msg.sender,
                    kind: MessageKind::Accept,
                }];
                actions.extend(self.finalize(msg.sender));
                actions
            }
            MessageKind::Matched => {
                self.active.remove(&msg.sender);
                self.evaluate()
            }
            // A listener never has a proposal outstanding, so there is
            // nothing an Accept could answer.
            MessageKind::Accept => panic!(
                "{}: ACCEPT from {} while listening",
                self.id, msg.sender
            ),
        }
    }

    /// Commit to `partner` (own id = single) and notify the leftovers.
    fn finalize(&mut self, partner: NodeId) -> Vec<Action> {
        assert!(
            self.partner.is_none(),
            "{} finalized twice ({:?} then {})",
            self.id,
            self.partner,
            partner
        );
        self.partner = Some(partner);
        self.role = Role::Finalized;
        self.active
            .iter()
            .filter(|&&neighbor| neighbor != partner)
            .map(|&neighbor| Action::Send {
                to: neighbor,
                kind: MessageKind::Matched,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(id: u32, neighbors: &[u32]) -> Matcher {
        Matcher::new(NodeId(id), neighbors.iter().copied().map(NodeId))
    }

    fn send(to: u32, kind: MessageKind) -> Action {
        Action::Send {
            to: NodeId(to),
            kind,
        }
    }

    #[test]
    fn test_no_neighbors_finalizes_single() {
        let mut m = matcher(5, &[]);
        let actions = m.begin();
        assert!(actions.is_empty());
        assert_eq!(m.outcome(), Some(Outcome::Single));
        assert!(m.is_finalized());
    }

    #[test]
    fn test_highest_id_proposes_to_local_maximum() {
        let mut m = matcher(9, &[2, 7, 4]);
        let actions = m.begin();
        assert_eq!(actions, vec![send(7, MessageKind::Propose)]);
        assert_eq!(m.role(), Role::Proposing { target: NodeId(7) });
    }

    #[test]
    fn test_lower_id_listens() {
        let mut m = matcher(3, &[7, 1]);
        assert!(m.begin().is_empty());
        assert_eq!(m.role(), Role::Listening);
    }

    #[test]
    fn test_listener_accepts_first_proposal() {
        let mut m = matcher(2, &[1, 3, 5]);
        m.begin();
        let actions = m.on_message(&Message::propose(NodeId(5), NodeId(2)));
        // Accept goes out first, then the leftovers hear we are taken.
        assert_eq!(
            actions,
            vec![
                send(5, MessageKind::Accept),
                send(1, MessageKind::Matched),
                send(3, MessageKind::Matched),
            ]
        );
        assert_eq!(m.outcome(), Some(Outcome::Paired(NodeId(5))));
    }

    #[test]
    fn test_proposer_finalizes_on_accept_from_target() {
        let mut m = matcher(9, &[4, 7]);
        m.begin();
        let actions = m.on_message(&Message::accept(NodeId(7), NodeId(9)));
        assert_eq!(actions, vec![send(4, MessageKind::Matched)]);
        assert_eq!(m.outcome(), Some(Outcome::Paired(NodeId(7))));
    }

    #[test]
    fn test_proposer_ignores_stray_proposals() {
        let mut m = matcher(9, &[4, 7]);
        m.begin();
        let actions = m.on_message(&Message::propose(NodeId(4), NodeId(9)));
        assert!(actions.is_empty());
        assert_eq!(m.role(), Role::Proposing { target: NodeId(7) });
        // The stray sender stays in the active set; it is not taken yet.
        assert!(m.active_neighbors().contains(&NodeId(4)));
    }

    #[test]
    fn test_cross_proposal_finalizes_symmetrically() {
        let mut m = matcher(9, &[7]);
        m.begin();
        let actions = m.on_message(&Message::propose(NodeId(7), NodeId(9)));
        assert!(actions.is_empty());
        assert_eq!(m.outcome(), Some(Outcome::Paired(NodeId(7))));
    }

    #[test]
    fn test_matched_from_target_triggers_reevaluation() {
        let mut m = matcher(9, &[4, 7]);
        m.begin();
        let actions = m.on_message(&Message::matched(NodeId(7), NodeId(9)));
        // 7 is gone; 4 is the new local maximum and 9 still outranks it.
        assert_eq!(actions, vec![send(4, MessageKind::Propose)]);
        assert_eq!(m.role(), Role::Proposing { target: NodeId(4) });
        assert!(!m.active_neighbors().contains(&NodeId(7)));
    }

    #[test]
    fn test_matched_from_bystander_keeps_waiting() {
        let mut m = matcher(9, &[4, 7]);
        m.begin();
        let actions = m.on_message(&Message::matched(NodeId(4), NodeId(9)));
        assert!(actions.is_empty());
        assert_eq!(m.role(), Role::Proposing { target: NodeId(7) });
        assert!(!m.active_neighbors().contains(&NodeId(4)));
    }

    #[test]
    fn test_listener_reevaluates_after_matched() {
        // 3 listens while 7 is around; once 7 commits elsewhere, 3 outranks
        // its remaining neighborhood and proposes to 1.
        let mut m = matcher(3, &[1, 7]);
        m.begin();
        assert_eq!(m.role(), Role::Listening);
        let actions = m.on_message(&Message::matched(NodeId(7), NodeId(3)));
        assert_eq!(actions, vec![send(1, MessageKind::Propose)]);
        assert_eq!(m.role(), Role::Proposing { target: NodeId(1) });
    }

    #[test]
    fn test_listener_goes_single_when_neighborhood_empties() {
        let mut m = matcher(3, &[7]);
        m.begin();
        let actions = m.on_message(&Message::matched(NodeId(7), NodeId(3)));
        assert!(actions.is_empty());
        assert_eq!(m.outcome(), Some(Outcome::Single));
    }

    #[test]
    fn test_active_set_only_shrinks() {
        let mut m = matcher(9, &[1, 2, 7]);
        m.begin();
        assert_eq!(m.active_neighbors().len(), 3);
        m.on_message(&Message::matched(NodeId(1), NodeId(9)));
        assert_eq!(m.active_neighbors().len(), 2);
        m.on_message(&Message::matched(NodeId(2), NodeId(9)));
        assert_eq!(m.active_neighbors().len(), 1);
        // Proposals never re-add a pruned neighbor.
        m.on_message(&Message::propose(NodeId(2), NodeId(9)));
        assert_eq!(m.active_neighbors().len(), 1);
    }

    #[test]
    #[should_panic(expected = "delivered in role")]
    fn test_message_after_finalization_is_a_violation() {
        let mut m = matcher(2, &[5]);
        m.begin();
        m.on_message(&Message::propose(NodeId(5), NodeId(2)));
        assert!(m.is_finalized());
        m.on_message(&Message::propose(NodeId(5), NodeId(2)));
    }

    #[test]
    #[should_panic(expected = "while listening")]
    fn test_accept_while_listening_is_a_violation() {
        let mut m = matcher(2, &[5]);
        m.begin();
        m.on_message(&Message::accept(NodeId(5), NodeId(2)));
    }

    #[test]
    fn test_two_machines_pair_via_message_relay() {
        let mut low = matcher(0, &[1]);
        let mut high = matcher(1, &[0]);

        assert!(low.begin().is_empty());
        let proposals = high.begin();
        assert_eq!(proposals, vec![send(0, MessageKind::Propose)]);

        let accepts = low.on_message(&Message::propose(NodeId(1), NodeId(0)));
        assert_eq!(accepts, vec![send(1, MessageKind::Accept)]);

        let done = high.on_message(&Message::accept(NodeId(0), NodeId(1)));
        assert!(done.is_empty());

        assert_eq!(low.outcome(), Some(Outcome::Paired(NodeId(1))));
        assert_eq!(high.outcome(), Some(Outcome::Paired(NodeId(0))));
    }
}
