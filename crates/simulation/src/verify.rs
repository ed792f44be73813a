//! Post-hoc verification of a finished run.
//!
//! Verification is a diagnostic pass over the immutable topology and the
//! collected outcomes; a failed check is data in the report, not an error.

use pairwise_types::{NodeId, Outcome, Topology};
use std::collections::BTreeMap;

/// Result of checking a run against the matching invariants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationReport {
    /// Edges whose endpoints both finished single — maximality violations.
    pub adjacent_singles: Vec<(NodeId, NodeId)>,
    /// Nodes whose claimed partner does not claim them back, as
    /// `(node, claimed partner)`.
    pub asymmetric_pairs: Vec<(NodeId, NodeId)>,
    /// Nodes paired with something that is not a graph neighbor.
    pub foreign_partners: Vec<(NodeId, NodeId)>,
}

impl VerificationReport {
    /// Whether every invariant held.
    pub fn passed(&self) -> bool {
        self.adjacent_singles.is_empty()
            && self.asymmetric_pairs.is_empty()
            && self.foreign_partners.is_empty()
    }
}

/// Check maximality, symmetry, and partner sanity over final outcomes.
pub fn verify(topology: &Topology, outcomes: &BTreeMap<NodeId, Outcome>) -> VerificationReport {
    let mut report = VerificationReport::default();

    for (u, v) in topology.edges() {
        let u_single = outcomes.get(&u).is_some_and(|o| o.is_single());
        let v_single = outcomes.get(&v).is_some_and(|o| o.is_single());
        if u_single && v_single {
            report.adjacent_singles.push((u, v));
        }
    }

    for (&node, outcome) in outcomes {
        let Some(partner) = outcome.partner() else {
            continue;
        };
        if !topology.contains_edge(node, partner) {
            report.foreign_partners.push((node, partner));
        }
        if outcomes.get(&partner) != Some(&Outcome::Paired(node)) {
            report.asymmetric_pairs.push((node, partner));
        }
    }

    report
}
