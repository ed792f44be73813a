//! The undirected graph nodes negotiate over.

use crate::NodeId;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeSet;

/// Errors that can occur when constructing a topology.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopologyError {
    /// An edge connects a node to itself.
    #[error("self-loop on {0}")]
    SelfLoop(NodeId),

    /// An edge endpoint is outside the dense id range.
    #[error("{node} out of range for a topology of {num_nodes} nodes")]
    NodeOutOfRange { node: NodeId, num_nodes: u32 },

    /// The same undirected edge was given twice.
    #[error("duplicate edge between {0} and {1}")]
    DuplicateEdge(NodeId, NodeId),
}

/// Immutable undirected graph over dense node ids `0..n`.
///
/// Built once before a run and never mutated afterward. Each node's
/// *active neighbor set* inside the protocol engine is a shrinking copy of
/// the adjacency stored here; the topology itself is the fixed reference
/// the final verification pass runs against.
#[derive(Debug, Clone)]
pub struct Topology {
    adjacency: Vec<BTreeSet<NodeId>>,
}

impl Topology {
    /// Create a topology with `num_nodes` nodes and no edges.
    pub fn empty(num_nodes: u32) -> Self {
        Self {
            adjacency: vec![BTreeSet::new(); num_nodes as usize],
        }
    }

    /// Build a topology from an explicit edge list.
    ///
    /// Rejects self-loops, out-of-range endpoints, and duplicate edges.
    /// Connectivity is *not* required: disconnected components and isolated
    /// nodes are legal inputs.
    pub fn from_edges(
        num_nodes: u32,
        edges: impl IntoIterator<Item = (u32, u32)>,
    ) -> Result<Self, TopologyError> {
        let mut topology = Self::empty(num_nodes);
        for (u, v) in edges {
            let (u, v) = (NodeId(u), NodeId(v));
            if u == v {
                return Err(TopologyError::SelfLoop(u));
            }
            for node in [u, v] {
                if node.index() >= topology.adjacency.len() {
                    return Err(TopologyError::NodeOutOfRange { node, num_nodes });
                }
            }
            if !topology.insert_edge(u, v) {
                return Err(TopologyError::DuplicateEdge(u, v));
            }
        }
        Ok(topology)
    }

    /// Generate a random connected graph.
    ///
    /// Shuffles the id space, chains consecutive shuffled ids into a spanning
    /// path (guaranteeing connectivity), then attempts `extra_edges` more
    /// random edges, silently skipping self-loops and duplicates.
    /// Deterministic for a given RNG state.
    pub fn random_connected(num_nodes: u32, extra_edges: u32, rng: &mut impl Rng) -> Self {
        let mut topology = Self::empty(num_nodes);
        if num_nodes < 2 {
            return topology;
        }

        let mut shuffled: Vec<u32> = (0..num_nodes).collect();
        shuffled.shuffle(rng);
        for pair in shuffled.windows(2) {
            topology.insert_edge(NodeId(pair[0]), NodeId(pair[1]));
        }

        for _ in 0..extra_edges {
            let u = NodeId(rng.gen_range(0..num_nodes));
            let v = NodeId(rng.gen_range(0..num_nodes));
            if u != v {
                topology.insert_edge(u, v);
            }
        }
        topology
    }

    /// Path graph `0 - 1 - ... - (n-1)`.
    pub fn path(num_nodes: u32) -> Self {
        let mut topology = Self::empty(num_nodes);
        for i in 1..num_nodes {
            topology.insert_edge(NodeId(i - 1), NodeId(i));
        }
        topology
    }

    /// Star graph: node 0 connected to every other node.
    pub fn star(num_nodes: u32) -> Self {
        let mut topology = Self::empty(num_nodes);
        for i in 1..num_nodes {
            topology.insert_edge(NodeId(0), NodeId(i));
        }
        topology
    }

    /// Complete graph over `num_nodes` nodes.
    pub fn complete(num_nodes: u32) -> Self {
        let mut topology = Self::empty(num_nodes);
        for u in 0..num_nodes {
            for v in (u + 1)..num_nodes {
                topology.insert_edge(NodeId(u), NodeId(v));
            }
        }
        topology
    }

    /// Insert an undirected edge; returns false if it already existed.
    fn insert_edge(&mut self, u: NodeId, v: NodeId) -> bool {
        debug_assert_ne!(u, v);
        let inserted = self.adjacency[u.index()].insert(v);
        self.adjacency[v.index()].insert(u);
        inserted
    }

    /// Number of nodes.
    pub fn num_nodes(&self) -> u32 {
        self.adjacency.len() as u32
    }

    /// Iterate over all node ids in increasing order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.num_nodes()).map(NodeId)
    }

    /// Neighbor set of a node.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    pub fn neighbors(&self, node: NodeId) -> &BTreeSet<NodeId> {
        &self.adjacency[node.index()]
    }

    /// Whether `u` and `v` share an edge.
    pub fn contains_edge(&self, u: NodeId, v: NodeId) -> bool {
        self.adjacency
            .get(u.index())
            .is_some_and(|set| set.contains(&v))
    }

    /// All undirected edges as `(u, v)` with `u < v`, in order.
    pub fn edges(&self) -> Vec<(NodeId, NodeId)> {
        let mut edges = Vec::new();
        for u in self.node_ids() {
            for &v in &self.adjacency[u.index()] {
                if u < v {
                    edges.push((u, v));
                }
            }
        }
        edges
    }

    /// Total edge count.
    pub fn num_edges(&self) -> usize {
        self.adjacency.iter().map(|set| set.len()).sum::<usize>() / 2
    }
}
