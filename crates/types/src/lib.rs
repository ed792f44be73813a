//! Core types for the pairwise matching protocol.

mod identifiers;
mod outcome;
mod topology;

pub use identifiers::NodeId;
pub use outcome::Outcome;
pub use topology::{Topology, TopologyError};
