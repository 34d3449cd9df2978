//! Validated changes handed to the graph store for an atomic commit

use crate::edge::{Edge, EdgeId};
use crate::node::{Node, NodeId};
use crate::snapshot::{GraphSnapshot, Version};

/// A single change to the stored graph
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    InsertNode(Node),
    UpdateNode(Node),
    RemoveNode(NodeId),
    InsertEdge(Edge),
    UpdateEdge(Edge),
    RemoveEdge(EdgeId),
}

/// Everything one batch changes, planned against a single snapshot.
///
/// The store applies the whole set or nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationSet {
    /// Version of the snapshot the mutations were planned against
    pub base_version: Version,
    /// Node id counter after the ids this set allocated
    pub next_node_id: u64,
    /// Edge id counter after the ids this set allocated
    pub next_edge_id: u64,
    pub mutations: Vec<Mutation>,
}

impl MutationSet {
    /// An empty set planned against `snapshot`
    pub fn against(snapshot: &GraphSnapshot) -> Self {
        Self {
            base_version: snapshot.version(),
            next_node_id: snapshot.next_node_id(),
            next_edge_id: snapshot.next_edge_id(),
            mutations: Vec::new(),
        }
    }

    /// Version the store will be at once this set commits
    pub fn target_version(&self) -> Version {
        self.base_version + 1
    }

    pub fn push(&mut self, mutation: Mutation) {
        self.mutations.push(mutation);
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    /// Reserve the next node id
    pub fn allocate_node_id(&mut self) -> NodeId {
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;
        id
    }

    /// Reserve the next edge id
    pub fn allocate_edge_id(&mut self) -> EdgeId {
        let id = EdgeId(self.next_edge_id);
        self.next_edge_id += 1;
        id
    }
}
