//! Entity resolver combining exact and fuzzy matching
//!
//! Ranking: score, then most recent `updated_at`, then larger alias set.
//! When the two best candidates tie on all three the mention resolves to
//! `New`: an ambiguous mention must never be merged into an established
//! identity by guesswork.

use std::cmp::Ordering;

use serde::Serialize;

use crate::config::ResolverConfig;
use crate::exact::ExactMatcher;
use crate::fuzzy::FuzzyMatcher;
use crate::traits::{Candidate, Resolution, Resolve};
use turnip_core::{limits, GraphSnapshot, Result};

const SCORE_EPSILON: f64 = 1e-9;

/// Which stage produced the ranked candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStage {
    Exact,
    Fuzzy,
    /// Nothing matched
    None,
}

/// Full resolution result, for inspection and logging
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranking {
    pub resolution: Resolution,
    pub stage: MatchStage,
    /// Candidates best first
    pub candidates: Vec<Candidate>,
    /// The two best candidates tied and the mention was treated as new
    pub ambiguous: bool,
}

/// Default resolver: exact match first, type-scoped fuzzy match second
#[derive(Debug, Clone, Default)]
pub struct EntityResolver {
    config: ResolverConfig,
}

impl EntityResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    fn fuzzy(&self) -> FuzzyMatcher {
        FuzzyMatcher::new(self.config.fuzzy_threshold)
            .with_type_scoping(self.config.type_scoped)
            .with_min_len(self.config.min_fuzzy_len)
    }

    /// Resolve and return every candidate considered
    pub fn explain(
        &self,
        mention: &str,
        type_hint: Option<&str>,
        snapshot: &GraphSnapshot,
    ) -> Result<Ranking> {
        limits::validate_mention(mention)?;

        let mut exact = ExactMatcher::new().candidates(mention, snapshot);
        if !exact.is_empty() {
            // Prefer exact matches whose type agrees with the hint
            if let Some(hint) = type_hint {
                let agreeing: Vec<Candidate> = exact
                    .iter()
                    .filter(|c| {
                        snapshot
                            .node(c.node_id)
                            .and_then(|n| n.node_type.as_ref())
                            .map_or(true, |t| t.matches(hint))
                    })
                    .cloned()
                    .collect();
                if !agreeing.is_empty() {
                    exact = agreeing;
                }
            }
            return Ok(Self::pick(mention, MatchStage::Exact, exact));
        }

        if self.config.fuzzy_enabled {
            let fuzzy = self.fuzzy().candidates(mention, type_hint, snapshot);
            if !fuzzy.is_empty() {
                return Ok(Self::pick(mention, MatchStage::Fuzzy, fuzzy));
            }
        }

        Ok(Ranking {
            resolution: Resolution::New,
            stage: MatchStage::None,
            candidates: Vec::new(),
            ambiguous: false,
        })
    }

    fn rank(a: &Candidate, b: &Candidate) -> Ordering {
        if (a.score - b.score).abs() > SCORE_EPSILON {
            return b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal);
        }
        b.updated_at
            .cmp(&a.updated_at)
            .then(b.alias_count.cmp(&a.alias_count))
            .then(a.node_id.cmp(&b.node_id))
    }

    fn tied(a: &Candidate, b: &Candidate) -> bool {
        (a.score - b.score).abs() <= SCORE_EPSILON
            && a.updated_at == b.updated_at
            && a.alias_count == b.alias_count
    }

    fn pick(mention: &str, stage: MatchStage, mut candidates: Vec<Candidate>) -> Ranking {
        candidates.sort_by(Self::rank);

        let ambiguous = matches!(candidates.as_slice(), [first, second, ..] if Self::tied(first, second));
        let resolution = if ambiguous {
            tracing::warn!(
                "Ambiguous mention '{}': {} candidates tie, treating as new",
                mention,
                candidates
                    .iter()
                    .filter(|c| Self::tied(c, &candidates[0]))
                    .count()
            );
            Resolution::New
        } else {
            Resolution::Resolved(candidates[0].node_id)
        };

        tracing::debug!(
            "Resolved '{}' via {:?} to {:?} ({} candidates)",
            mention,
            stage,
            resolution,
            candidates.len()
        );

        Ranking {
            resolution,
            stage,
            candidates,
            ambiguous,
        }
    }
}

impl Resolve for EntityResolver {
    fn resolve(
        &self,
        mention: &str,
        type_hint: Option<&str>,
        snapshot: &GraphSnapshot,
    ) -> Result<Resolution> {
        Ok(self.explain(mention, type_hint, snapshot)?.resolution)
    }
}
