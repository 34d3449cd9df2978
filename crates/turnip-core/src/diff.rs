//! Batch results: net graph diff and per-operation outcomes

use crate::edge::EdgeId;
use crate::node::NodeId;
use serde::{Deserialize, Serialize};

/// Net change a committed batch made, relative to the snapshot it started from.
///
/// A node created and removed within the same batch shows up nowhere; a node
/// created and then updated is only listed as added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diff {
    pub nodes_added: Vec<NodeId>,
    pub nodes_updated: Vec<NodeId>,
    pub nodes_removed: Vec<NodeId>,
    pub edges_added: Vec<EdgeId>,
    pub edges_updated: Vec<EdgeId>,
    pub edges_removed: Vec<EdgeId>,
}

impl Diff {
    pub fn is_empty(&self) -> bool {
        self.nodes_added.is_empty()
            && self.nodes_updated.is_empty()
            && self.nodes_removed.is_empty()
            && self.edges_added.is_empty()
            && self.edges_updated.is_empty()
            && self.edges_removed.is_empty()
    }

    /// Compact counts, e.g. `nodes +2 ~0 -1, edges +1 ~0 -0`
    pub fn summary(&self) -> String {
        format!(
            "nodes +{} ~{} -{}, edges +{} ~{} -{}",
            self.nodes_added.len(),
            self.nodes_updated.len(),
            self.nodes_removed.len(),
            self.edges_added.len(),
            self.edges_updated.len(),
            self.edges_removed.len()
        )
    }
}

/// Why an operation left the graph untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoOpReason {
    /// Everything the operation states is already in the graph
    Unchanged,
    /// Delete of an entity the graph does not know
    UnknownEntity,
    /// Relation delete where an endpoint does not resolve
    UnknownEndpoint,
    /// Relation delete between known entities that are not related that way
    UnknownRelation,
}

/// What happened to one input operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OperationOutcome {
    /// The operation changed the records listed
    Applied {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        nodes: Vec<NodeId>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        edges: Vec<EdgeId>,
    },
    NoOp { reason: NoOpReason },
}

impl OperationOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    pub fn no_op(reason: NoOpReason) -> Self {
        Self::NoOp { reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_diff() {
        let diff = Diff::default();
        assert!(diff.is_empty());
        assert_eq!(diff.summary(), "nodes +0 ~0 -0, edges +0 ~0 -0");
    }

    #[test]
    fn test_outcome_serialization() {
        let applied = OperationOutcome::Applied {
            nodes: vec![NodeId(1)],
            edges: vec![],
        };
        assert_eq!(
            serde_json::to_value(&applied).unwrap(),
            json!({"outcome": "applied", "nodes": [1]})
        );

        let no_op = OperationOutcome::no_op(NoOpReason::UnknownEntity);
        assert!(!no_op.is_applied());
        assert_eq!(
            serde_json::to_value(&no_op).unwrap(),
            json!({"outcome": "no_op", "reason": "unknown_entity"})
        );
    }
}
