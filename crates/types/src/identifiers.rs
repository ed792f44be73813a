//! Domain-specific identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Protocol participant identifier.
///
/// Ids are dense integers `0..n`, assigned at topology construction and
/// stable for the lifetime of a run. Ordering between ids is what breaks
/// symmetry in the matching protocol, so `Ord` here is load-bearing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Index into dense per-node storage (inboxes, send handles).
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

impl From<u32> for NodeId {
    fn from(raw: u32) -> Self {
        NodeId(raw)
    }
}
