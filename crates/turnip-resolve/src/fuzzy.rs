//! Fuzzy matcher - normalized edit distance and token overlap

use crate::config::normalize_threshold;
use crate::traits::{Candidate, MatchKind};
use turnip_core::{mention_key, GraphSnapshot, Node};

/// Levenshtein distance between two char sequences.
fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr: Vec<usize> = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// `1 - distance / longer length`, on case-folded input.
pub fn edit_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = mention_key(a).chars().collect();
    let b: Vec<char> = mention_key(b).chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(&a, &b) as f64 / longest as f64
}

fn tokens(s: &str) -> Vec<String> {
    let mut out: Vec<String> = s
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect();
    out.sort();
    out.dedup();
    out
}

/// Jaccard overlap of the alphanumeric word sets.
pub fn token_overlap(a: &str, b: &str) -> f64 {
    let a = tokens(a);
    let b = tokens(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.iter().filter(|t| b.binary_search(t).is_ok()).count();
    let union = a.len() + b.len() - shared;
    shared as f64 / union as f64
}

/// Similarity used for fuzzy resolution: the better of both measures.
pub fn similarity(a: &str, b: &str) -> f64 {
    edit_similarity(a, b).max(token_overlap(a, b))
}

/// Stateless fuzzy matcher with a similarity threshold
pub struct FuzzyMatcher {
    pub threshold: f64,
    pub type_scoped: bool,
    pub min_len: usize,
}

impl FuzzyMatcher {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: normalize_threshold(threshold),
            type_scoped: true,
            min_len: 3,
        }
    }

    pub fn with_type_scoping(mut self, type_scoped: bool) -> Self {
        self.type_scoped = type_scoped;
        self
    }

    pub fn with_min_len(mut self, min_len: usize) -> Self {
        self.min_len = min_len;
        self
    }

    /// Untyped nodes are compatible with any hint
    fn type_compatible(&self, node: &Node, type_hint: Option<&str>) -> bool {
        match (self.type_scoped, type_hint, &node.node_type) {
            (true, Some(hint), Some(node_type)) if !hint.trim().is_empty() => {
                node_type.matches(hint)
            }
            _ => true,
        }
    }

    /// Nodes whose best-scoring name clears the threshold, in id order
    pub fn candidates(
        &self,
        mention: &str,
        type_hint: Option<&str>,
        snapshot: &GraphSnapshot,
    ) -> Vec<Candidate> {
        if mention_key(mention).chars().count() < self.min_len {
            return Vec::new();
        }

        snapshot
            .nodes()
            .filter(|node| self.type_compatible(node, type_hint))
            .filter_map(|node| {
                let (matched, score) = node
                    .aliases
                    .iter()
                    .map(|alias| (alias, similarity(mention, alias)))
                    .fold(None, |best: Option<(&String, f64)>, (alias, score)| match best {
                        Some((_, best_score)) if best_score >= score => best,
                        _ => Some((alias, score)),
                    })?;

                if score < self.threshold {
                    return None;
                }

                Some(Candidate {
                    node_id: node.id,
                    score,
                    kind: MatchKind::Fuzzy,
                    matched: matched.clone(),
                    updated_at: node.updated_at,
                    alias_count: node.aliases.len(),
                })
            })
            .collect()
    }
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new(0.85)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turnip_core::NodeId;

    fn snapshot(nodes: Vec<Node>) -> GraphSnapshot {
        let next = nodes.iter().map(|n| n.id.0).max().unwrap_or(0) + 1;
        GraphSnapshot::from_parts(
            1,
            next,
            1,
            nodes.into_iter().map(|n| (n.id, n)).collect(),
            Default::default(),
        )
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_levenshtein() {
        let chars = |s: &str| s.chars().collect::<Vec<_>>();
        assert_eq!(levenshtein(&chars("kitten"), &chars("sitting")), 3);
        assert_eq!(levenshtein(&chars(""), &chars("abc")), 3);
        assert_eq!(levenshtein(&chars("same"), &chars("same")), 0);
    }

    #[test]
    fn test_edit_similarity() {
        assert!(close(edit_similarity("Jason", "jasin"), 0.8));
        assert!(close(edit_similarity("Alice", "ALICE"), 1.0));
        assert!(close(edit_similarity("Jon Smithson", "Jen Smithson"), 1.0 - 1.0 / 12.0));
    }

    #[test]
    fn test_token_overlap() {
        assert!(close(
            token_overlap("Toronto University", "University of Toronto"),
            2.0 / 3.0
        ));
        assert!(close(token_overlap("Acme", "Globex"), 0.0));
        assert!(close(token_overlap("", "Acme"), 0.0));
    }

    #[test]
    fn test_candidates_above_threshold() {
        let snapshot = snapshot(vec![
            Node::new(NodeId(1), "Jon Smithson", 1).with_type("Person"),
            Node::new(NodeId(2), "Acme", 1).with_type("Organization"),
        ]);

        let hits = FuzzyMatcher::new(0.85).candidates("Jonn Smithson", Some("person"), &snapshot);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].node_id, NodeId(1));
        assert_eq!(hits[0].kind, MatchKind::Fuzzy);
        assert!(hits[0].score > 0.9);
    }

    #[test]
    fn test_type_scoping_excludes_other_kinds() {
        let snapshot = snapshot(vec![Node::new(NodeId(1), "Jon Smithson", 1).with_type("Person")]);

        let scoped = FuzzyMatcher::new(0.85);
        assert!(scoped
            .candidates("Jonn Smithson", Some("Organization"), &snapshot)
            .is_empty());

        let unscoped = FuzzyMatcher::new(0.85).with_type_scoping(false);
        assert_eq!(
            unscoped
                .candidates("Jonn Smithson", Some("Organization"), &snapshot)
                .len(),
            1
        );
    }

    #[test]
    fn test_untyped_nodes_match_any_hint() {
        let snapshot = snapshot(vec![Node::new(NodeId(1), "Jon Smithson", 1)]);
        let hits = FuzzyMatcher::new(0.85).candidates("Jonn Smithson", Some("Person"), &snapshot);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_short_mentions_never_fuzzy_match() {
        let snapshot = snapshot(vec![Node::new(NodeId(1), "Al", 1)]);
        assert!(FuzzyMatcher::new(0.0).candidates("Ab", None, &snapshot).is_empty());
    }
}
