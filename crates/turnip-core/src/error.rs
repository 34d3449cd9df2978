//! Error types for Turnip Core

use crate::edge::EdgeId;
use crate::node::NodeId;
use thiserror::Error;

/// Result type alias using Turnip's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Turnip error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid mention: {0}")]
    InvalidMention(String),

    #[error("Invalid relation: {0}")]
    InvalidRelation(String),

    #[error("Invalid attributes: {0}")]
    InvalidAttributes(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(#[from] Violation),

    #[error("Merge failed: {reason}")]
    MergeFailed {
        /// Index of the operation that aborted the batch, if one did
        operation: Option<usize>,
        reason: String,
    },

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Wrap a validation or constraint error as the batch-level failure.
    pub fn into_merge_failed(self, operation: Option<usize>) -> Self {
        match self {
            Self::MergeFailed { .. } => self,
            other => Self::MergeFailed {
                operation,
                reason: other.to_string(),
            },
        }
    }

    pub fn is_merge_failed(&self) -> bool {
        matches!(self, Self::MergeFailed { .. })
    }
}

/// Graph integrity constraints enforced by the store at commit time
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    #[error("edge {edge} references missing node {node}")]
    DanglingEdge { edge: EdgeId, node: NodeId },

    #[error("node id {0} already exists")]
    DuplicateNodeId(NodeId),

    #[error("edge id {0} already exists")]
    DuplicateEdgeId(EdgeId),

    #[error("edge {source_id} -[{relation}]-> {target_id} already exists")]
    DuplicateEdgeKey {
        source_id: NodeId,
        relation: String,
        target_id: NodeId,
    },

    #[error("node {0} does not exist")]
    UnknownNode(NodeId),

    #[error("edge {0} does not exist")]
    UnknownEdge(EdgeId),

    #[error("id {0} was allocated before and cannot be reused")]
    ReusedId(u64),

    #[error("mutations were planned against version {planned}, store is at {current}")]
    StaleSnapshot { planned: u64, current: u64 },

    #[error("label of node {0} is missing from its aliases")]
    LabelNotAliased(NodeId),

    #[error("aliases of node {0} would shrink")]
    AliasesShrunk(NodeId),
}
