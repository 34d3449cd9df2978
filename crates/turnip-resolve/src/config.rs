//! Resolver configuration

use serde::{Deserialize, Serialize};

/// Tuning knobs for entity resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Fall back to fuzzy matching when no exact match exists
    #[serde(default = "default_true")]
    pub fuzzy_enabled: bool,

    /// Minimum similarity (0.0-1.0) for a fuzzy match
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,

    /// Only fuzzy-match nodes whose type agrees with the type hint
    #[serde(default = "default_true")]
    pub type_scoped: bool,

    /// Mentions shorter than this (in chars) never match fuzzily
    #[serde(default = "default_min_fuzzy_len")]
    pub min_fuzzy_len: usize,
}

fn default_true() -> bool {
    true
}

fn default_fuzzy_threshold() -> f64 {
    0.85
}

/// Clamp into 0.0-1.0; NaN falls back to the default
pub(crate) fn normalize_threshold(threshold: f64) -> f64 {
    if threshold.is_nan() {
        tracing::warn!(
            "Fuzzy threshold is NaN, using {}",
            default_fuzzy_threshold()
        );
        return default_fuzzy_threshold();
    }
    threshold.clamp(0.0, 1.0)
}

fn default_min_fuzzy_len() -> usize {
    3
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fuzzy_enabled: true,
            fuzzy_threshold: default_fuzzy_threshold(),
            type_scoped: true,
            min_fuzzy_len: default_min_fuzzy_len(),
        }
    }
}

impl ResolverConfig {
    /// Exact matching only
    pub fn exact_only() -> Self {
        Self {
            fuzzy_enabled: false,
            ..Self::default()
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.fuzzy_threshold = normalize_threshold(threshold);
        self
    }

    pub fn with_type_scoping(mut self, type_scoped: bool) -> Self {
        self.type_scoped = type_scoped;
        self
    }
}
