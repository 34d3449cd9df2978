//! JSON file persistence

use crate::error::StorageResult;
use crate::migration::PersistedGraph;
use crate::traits::SnapshotPersistence;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use turnip_core::GraphSnapshot;

/// Stores the snapshot as one pretty-printed JSON file.
///
/// Saves write a sibling temp file and rename it over the target, so a
/// crash mid-save leaves the previous snapshot intact.
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl SnapshotPersistence for JsonFilePersistence {
    async fn load(&self) -> StorageResult<Option<GraphSnapshot>> {
        if !tokio::fs::try_exists(&self.path).await? {
            return Ok(None);
        }
        let bytes = tokio::fs::read(&self.path).await?;
        let persisted = PersistedGraph::decode(&bytes)?;
        tracing::debug!(
            "Read {:?} (schema v{}, saved {})",
            self.path,
            persisted.schema_version,
            persisted.saved_at
        );
        Ok(Some(persisted.snapshot))
    }

    async fn save(&self, snapshot: &GraphSnapshot) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let bytes = PersistedGraph::new(snapshot.clone()).encode()?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, &bytes).await?;
        tokio::fs::rename(&temp, &self.path).await?;

        tracing::debug!("Saved version {} to {:?}", snapshot.version(), self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use turnip_core::{Node, NodeId};

    #[tokio::test]
    async fn test_missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = JsonFilePersistence::new(dir.path().join("graph.json"));
        assert!(persistence.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = JsonFilePersistence::new(dir.path().join("nested/graph.json"));

        let alice = Node::new(NodeId(1), "Alice", 1).with_type("Person");
        let snapshot = GraphSnapshot::from_parts(
            1,
            2,
            1,
            [(alice.id, alice)].into_iter().collect(),
            Default::default(),
        );
        persistence.save(&snapshot).await.unwrap();

        assert!(!persistence.temp_path().exists());
        assert_eq!(persistence.load().await.unwrap(), Some(snapshot));
    }

    #[tokio::test]
    async fn test_garbage_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        std::fs::write(&path, b"{\"nodes\": 3}").unwrap();

        let err = JsonFilePersistence::new(&path).load().await.unwrap_err();
        assert!(matches!(err, StorageError::MissingSchemaVersion));
    }
}
