//! Persistence hook trait definitions

use crate::error::StorageResult;
use async_trait::async_trait;
use turnip_core::GraphSnapshot;

/// Loads and saves whole graph snapshots.
///
/// The store stays authoritative in memory; backends only see committed
/// snapshots and never partial batches.
#[async_trait]
pub trait SnapshotPersistence: Send + Sync {
    /// Last saved snapshot, or `None` if nothing was saved yet
    async fn load(&self) -> StorageResult<Option<GraphSnapshot>>;

    /// Replace the saved snapshot
    async fn save(&self, snapshot: &GraphSnapshot) -> StorageResult<()>;

    /// Health check
    async fn health_check(&self) -> StorageResult<bool> {
        Ok(true)
    }
}
