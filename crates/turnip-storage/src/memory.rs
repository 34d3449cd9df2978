//! In-memory persistence for testing

use crate::error::{StorageError, StorageResult};
use crate::traits::SnapshotPersistence;
use async_trait::async_trait;
use std::sync::RwLock;
use turnip_core::GraphSnapshot;

/// Keeps the last saved snapshot in memory.
///
/// Useful for tests and for hosts that do not need durability.
pub struct MemoryPersistence {
    saved: RwLock<Option<GraphSnapshot>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self {
            saved: RwLock::new(None),
        }
    }
}

impl Default for MemoryPersistence {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotPersistence for MemoryPersistence {
    async fn load(&self) -> StorageResult<Option<GraphSnapshot>> {
        let saved = self
            .saved
            .read()
            .map_err(|e| StorageError::Poisoned(e.to_string()))?;
        Ok(saved.clone())
    }

    async fn save(&self, snapshot: &GraphSnapshot) -> StorageResult<()> {
        let mut saved = self
            .saved
            .write()
            .map_err(|e| StorageError::Poisoned(e.to_string()))?;
        *saved = Some(snapshot.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_persistence() {
        let persistence = MemoryPersistence::new();
        assert!(persistence.load().await.unwrap().is_none());

        let snapshot = GraphSnapshot::empty();
        persistence.save(&snapshot).await.unwrap();
        assert_eq!(persistence.load().await.unwrap(), Some(snapshot));
        assert!(persistence.health_check().await.unwrap());
    }
}
