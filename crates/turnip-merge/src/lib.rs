//! Turnip Merge - Incremental graph-merge engine
//!
//! Turns batches of proposed operations into validated mutation sets,
//! resolving every mention against the current snapshot, and commits each
//! batch atomically. Batches are applied one at a time in arrival order.

pub mod engine;
pub mod pipeline;
pub mod plan;
pub mod replay;

pub use engine::{EngineConfig, MergeEngine, MergeReport};
pub use pipeline::{NoRender, TurnOutcome, TurnPipeline};
pub use plan::{plan_batch, PlannedBatch};
pub use replay::ReplayExtractor;
