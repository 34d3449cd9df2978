//! Immutable point-in-time views of the graph

use crate::edge::{Edge, EdgeId, EdgeKey};
use crate::error::Violation;
use crate::node::{mention_key, Attributes, Node, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Logical graph version, bumped once per committed batch
pub type Version = u64;

/// A consistent view of all nodes and edges at one version.
///
/// Snapshots are never mutated after construction; the store hands them out
/// behind an `Arc` so readers never wait on a commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SnapshotRepr", into = "SnapshotRepr")]
pub struct GraphSnapshot {
    version: Version,
    next_node_id: u64,
    next_edge_id: u64,
    nodes: BTreeMap<NodeId, Node>,
    edges: BTreeMap<EdgeId, Edge>,
}

impl Default for GraphSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl GraphSnapshot {
    /// The empty graph at version 0
    pub fn empty() -> Self {
        Self {
            version: 0,
            next_node_id: 1,
            next_edge_id: 1,
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
        }
    }

    /// Assemble a snapshot from raw parts. Callers are expected to run
    /// [`GraphSnapshot::check_integrity`] on untrusted input.
    pub fn from_parts(
        version: Version,
        next_node_id: u64,
        next_edge_id: u64,
        nodes: BTreeMap<NodeId, Node>,
        edges: BTreeMap<EdgeId, Edge>,
    ) -> Self {
        Self {
            version,
            next_node_id,
            next_edge_id,
            nodes,
            edges,
        }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// First node id not yet handed out
    pub fn next_node_id(&self) -> u64 {
        self.next_node_id
    }

    /// First edge id not yet handed out
    pub fn next_edge_id(&self) -> u64 {
        self.next_edge_id
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Nodes in id order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Edges in id order
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn node_map(&self) -> &BTreeMap<NodeId, Node> {
        &self.nodes
    }

    pub fn edge_map(&self) -> &BTreeMap<EdgeId, Edge> {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Edges with `node` as source or target
    pub fn incident_edges(&self, node: NodeId) -> impl Iterator<Item = &Edge> {
        self.edges.values().filter(move |e| e.is_incident_to(node))
    }

    pub fn find_edge(&self, key: &EdgeKey) -> Option<&Edge> {
        self.edges.values().find(|e| e.key() == *key)
    }

    /// Nodes whose label or aliases equal `name`, ignoring case
    pub fn nodes_named(&self, name: &str) -> Vec<&Node> {
        let key = mention_key(name);
        self.nodes
            .values()
            .filter(|n| n.aliases.iter().any(|a| mention_key(a) == key))
            .collect()
    }

    /// Verify the invariants every committed snapshot holds.
    pub fn check_integrity(&self) -> Result<(), Violation> {
        for (id, node) in &self.nodes {
            if *id != node.id {
                return Err(Violation::UnknownNode(*id));
            }
            if node.id.0 >= self.next_node_id {
                return Err(Violation::ReusedId(node.id.0));
            }
            if !node.aliases.contains(&node.label) {
                return Err(Violation::LabelNotAliased(node.id));
            }
        }

        let mut keys = HashSet::new();
        for (id, edge) in &self.edges {
            if *id != edge.id {
                return Err(Violation::UnknownEdge(*id));
            }
            if edge.id.0 >= self.next_edge_id {
                return Err(Violation::ReusedId(edge.id.0));
            }
            for endpoint in [edge.source_id, edge.target_id] {
                if !self.nodes.contains_key(&endpoint) {
                    return Err(Violation::DanglingEdge {
                        edge: edge.id,
                        node: endpoint,
                    });
                }
            }
            let key = edge.key();
            if !keys.insert(key.clone()) {
                return Err(Violation::DuplicateEdgeKey {
                    source_id: key.source_id,
                    relation: key.relation,
                    target_id: key.target_id,
                });
            }
        }

        Ok(())
    }

    /// Id-free view of the graph for handing to a language model.
    pub fn prompt_view(&self) -> PromptView {
        let nodes = self
            .nodes
            .values()
            .map(|n| PromptNode {
                name: n.label.clone(),
                node_type: n.type_str().map(str::to_string),
                aliases: n
                    .aliases
                    .iter()
                    .filter(|a| **a != n.label)
                    .cloned()
                    .collect(),
                attributes: n.attributes.clone(),
            })
            .collect();

        let edges = self
            .edges
            .values()
            .filter_map(|e| {
                let source = self.nodes.get(&e.source_id)?;
                let target = self.nodes.get(&e.target_id)?;
                Some(PromptEdge {
                    source: source.label.clone(),
                    relation: e.relation.clone(),
                    target: target.label.clone(),
                    attributes: e.attributes.clone(),
                })
            })
            .collect();

        PromptView {
            version: self.version,
            nodes,
            edges,
        }
    }
}

/// Graph state as seen by the extraction model: names only, no ids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptView {
    pub version: Version,
    pub nodes: Vec<PromptNode>,
    pub edges: Vec<PromptEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptNode {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptEdge {
    pub source: String,
    pub relation: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: Attributes,
}

/// On-disk shape: lists instead of id-keyed maps
#[derive(Serialize, Deserialize)]
struct SnapshotRepr {
    version: Version,
    next_node_id: u64,
    next_edge_id: u64,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl From<SnapshotRepr> for GraphSnapshot {
    fn from(repr: SnapshotRepr) -> Self {
        Self {
            version: repr.version,
            next_node_id: repr.next_node_id,
            next_edge_id: repr.next_edge_id,
            nodes: repr.nodes.into_iter().map(|n| (n.id, n)).collect(),
            edges: repr.edges.into_iter().map(|e| (e.id, e)).collect(),
        }
    }
}

impl From<GraphSnapshot> for SnapshotRepr {
    fn from(snapshot: GraphSnapshot) -> Self {
        Self {
            version: snapshot.version,
            next_node_id: snapshot.next_node_id,
            next_edge_id: snapshot.next_edge_id,
            nodes: snapshot.nodes.into_values().collect(),
            edges: snapshot.edges.into_values().collect(),
        }
    }
}
