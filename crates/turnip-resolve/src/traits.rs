//! Resolver traits

use serde::Serialize;
use turnip_core::{GraphSnapshot, NodeId, Result};

/// Outcome of resolving one mention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// The mention names this existing node
    Resolved(NodeId),
    /// No node, or no single node, fits the mention
    New,
}

impl Resolution {
    pub fn node_id(&self) -> Option<NodeId> {
        match self {
            Self::Resolved(id) => Some(*id),
            Self::New => None,
        }
    }
}

/// How a candidate matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Fuzzy,
}

/// A node that matched a mention, with the data used to rank it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub node_id: NodeId,
    /// Similarity in 0.0-1.0 (1.0 for exact matches)
    pub score: f64,
    pub kind: MatchKind,
    /// The label or alias that produced the score
    pub matched: String,
    pub updated_at: u64,
    pub alias_count: usize,
}

/// Maps mentions to node identities.
///
/// Implementations must be deterministic: the same mention, hint and
/// snapshot always give the same resolution.
pub trait Resolve: Send + Sync {
    /// Resolve `mention`, rejecting empty mentions with `InvalidMention`
    fn resolve(
        &self,
        mention: &str,
        type_hint: Option<&str>,
        snapshot: &GraphSnapshot,
    ) -> Result<Resolution>;
}
