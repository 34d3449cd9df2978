//! Turnip Resolve - Entity resolution for the knowledge graph
//!
//! Maps a free-text mention to an existing node or to "new", using
//! case-insensitive exact matching first and a type-scoped fuzzy match
//! (edit distance and token overlap) second. Resolution is a pure function
//! of the mention, the optional type hint and the snapshot.

pub mod config;
pub mod exact;
pub mod fuzzy;
pub mod resolver;
pub mod traits;

pub use config::ResolverConfig;
pub use exact::ExactMatcher;
pub use fuzzy::{edit_similarity, similarity, token_overlap, FuzzyMatcher};
pub use resolver::{EntityResolver, MatchStage, Ranking};
pub use traits::{Candidate, MatchKind, Resolution, Resolve};
