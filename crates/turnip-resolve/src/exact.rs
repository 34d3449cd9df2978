//! Exact matcher - case-insensitive label and alias equality

use crate::traits::{Candidate, MatchKind};
use turnip_core::{mention_key, GraphSnapshot};

/// Stateless matcher comparing a mention with every label and alias
pub struct ExactMatcher;

impl ExactMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Nodes known by `mention`, in id order
    pub fn candidates(&self, mention: &str, snapshot: &GraphSnapshot) -> Vec<Candidate> {
        let key = mention_key(mention);
        if key.is_empty() {
            return Vec::new();
        }

        snapshot
            .nodes()
            .filter_map(|node| {
                let matched = node.aliases.iter().find(|a| mention_key(a) == key)?;
                Some(Candidate {
                    node_id: node.id,
                    score: 1.0,
                    kind: MatchKind::Exact,
                    matched: matched.clone(),
                    updated_at: node.updated_at,
                    alias_count: node.aliases.len(),
                })
            })
            .collect()
    }
}

impl Default for ExactMatcher {
    fn default() -> Self {
        Self::new()
    }
}
