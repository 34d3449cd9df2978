//! Turnip Core - Graph model for incremental knowledge graphs
//!
//! This crate provides the data types shared by the resolver, the graph
//! store and the merge engine: nodes, edges, immutable snapshots, the
//! operations a language model proposes, and the mutations and diffs the
//! merge engine produces from them.

pub mod adapter;
pub mod diff;
pub mod edge;
pub mod error;
pub mod limits;
pub mod mutation;
pub mod node;
pub mod operation;
pub mod snapshot;

pub use adapter::{ExtractionAdapter, RenderAdapter};
pub use diff::{Diff, NoOpReason, OperationOutcome};
pub use edge::{normalize_relation, Edge, EdgeId, EdgeKey};
pub use error::{Error, Result, Violation};
pub use mutation::{Mutation, MutationSet};
pub use node::{mention_key, normalize_mention, Attributes, Node, NodeId, NodeType};
pub use operation::{parse_operations, ProposedOperation};
pub use snapshot::{GraphSnapshot, PromptEdge, PromptNode, PromptView, Version};
