//! Edge (relation) types and operations

use crate::node::{merge_attributes, normalize_mention, Attributes, NodeId};
use serde::{Deserialize, Serialize};

/// Process-assigned edge identifier, never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub u64);

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalized relation label used for edge identity ("Knows " == "knows")
pub fn normalize_relation(relation: &str) -> String {
    normalize_mention(relation).to_lowercase()
}

/// Identity of an edge: `(source, normalized relation, target)`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeKey {
    pub source_id: NodeId,
    pub relation: String,
    pub target_id: NodeId,
}

impl EdgeKey {
    pub fn new(source_id: NodeId, relation: &str, target_id: NodeId) -> Self {
        Self {
            source_id,
            relation: normalize_relation(relation),
            target_id,
        }
    }
}

/// A directed, labelled edge between two nodes.
///
/// Symmetric relations are stored as two edges, one per direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,

    pub source_id: NodeId,

    pub target_id: NodeId,

    /// Relation label as first spelled (e.g. "knows", "works_at")
    pub relation: String,

    #[serde(default)]
    pub attributes: Attributes,

    pub created_at: u64,

    pub updated_at: u64,
}

impl Edge {
    pub fn new(
        id: EdgeId,
        source_id: NodeId,
        relation: impl Into<String>,
        target_id: NodeId,
        version: u64,
    ) -> Self {
        Self {
            id,
            source_id,
            target_id,
            relation: normalize_mention(&relation.into()),
            attributes: Attributes::new(),
            created_at: version,
            updated_at: version,
        }
    }

    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(self.source_id, &self.relation, self.target_id)
    }

    /// Check whether the edge touches `node` at either end
    pub fn is_incident_to(&self, node: NodeId) -> bool {
        self.source_id == node || self.target_id == node
    }

    pub fn merge_attributes(&mut self, attributes: &Attributes) -> bool {
        merge_attributes(&mut self.attributes, attributes)
    }
}
