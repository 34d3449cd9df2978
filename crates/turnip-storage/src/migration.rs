//! Persisted snapshot format and schema versions
//!
//! Every backend stores the same JSON envelope; the schema version travels
//! with it so older files can be upgraded on load.

use crate::error::{StorageError, StorageResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use turnip_core::GraphSnapshot;

/// Current schema version
pub const CURRENT_VERSION: u32 = 1;

/// Schema migration information
#[derive(Debug, Clone)]
pub struct SchemaVersion {
    pub version: u32,
    pub description: &'static str,
}

/// All schema versions with their migrations
pub fn get_migrations() -> Vec<SchemaVersion> {
    vec![SchemaVersion {
        version: 1,
        description: "Snapshot envelope with nodes, edges and id counters",
    }]
}

/// What backends write: a snapshot plus format metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedGraph {
    pub schema_version: u32,
    pub saved_at: DateTime<Utc>,
    pub snapshot: GraphSnapshot,
}

impl PersistedGraph {
    pub fn new(snapshot: GraphSnapshot) -> Self {
        Self {
            schema_version: CURRENT_VERSION,
            saved_at: Utc::now(),
            snapshot,
        }
    }

    pub fn encode(&self) -> StorageResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Decode an envelope, refusing formats newer than this build knows
    pub fn decode(bytes: &[u8]) -> StorageResult<Self> {
        let raw: serde_json::Value = serde_json::from_slice(bytes)?;
        let version = raw
            .get("schema_version")
            .and_then(serde_json::Value::as_u64)
            .ok_or(StorageError::MissingSchemaVersion)?;

        if version > u64::from(CURRENT_VERSION) {
            return Err(StorageError::UnsupportedSchema {
                found: version,
                supported: CURRENT_VERSION,
            });
        }

        Ok(serde_json::from_value(raw)?)
    }
}

/// Migration trait for storage backends
pub trait Migratable {
    /// Get the current schema version from storage
    fn get_schema_version(&self) -> StorageResult<u32>;

    /// Set the schema version in storage
    fn set_schema_version(&self, version: u32) -> StorageResult<()>;

    /// Run migrations from current version to target version
    fn migrate_to(&self, target_version: u32) -> StorageResult<()> {
        let current = self.get_schema_version()?;

        if current == target_version {
            tracing::debug!("Schema already at version {}", target_version);
            return Ok(());
        }

        if current > target_version {
            return Err(StorageError::Migration(format!(
                "schema version {} is newer than target {}",
                current, target_version
            )));
        }

        tracing::info!("Migrating schema from v{} to v{}", current, target_version);

        for version in (current + 1)..=target_version {
            self.run_migration(version)?;
            self.set_schema_version(version)?;
            tracing::info!("Migrated to schema version {}", version);
        }

        Ok(())
    }

    /// Run a specific migration
    fn run_migration(&self, version: u32) -> StorageResult<()>;

    /// Migrate to the latest version
    fn migrate_to_latest(&self) -> StorageResult<()> {
        self.migrate_to(CURRENT_VERSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_list() {
        let migrations = get_migrations();
        assert!(!migrations.is_empty());
        assert_eq!(migrations.last().map(|m| m.version), Some(CURRENT_VERSION));
    }

    #[test]
    fn test_envelope_decodes() {
        let envelope = PersistedGraph::new(GraphSnapshot::empty());
        let bytes = envelope.encode().unwrap();
        let decoded = PersistedGraph::decode(&bytes).unwrap();
        assert_eq!(decoded.schema_version, CURRENT_VERSION);
        assert_eq!(decoded.snapshot, GraphSnapshot::empty());
    }

    #[test]
    fn test_newer_schema_is_refused() {
        let mut value = serde_json::to_value(PersistedGraph::new(GraphSnapshot::empty())).unwrap();
        value["schema_version"] = serde_json::json!(CURRENT_VERSION + 1);
        let bytes = serde_json::to_vec(&value).unwrap();

        let err = PersistedGraph::decode(&bytes).unwrap_err();
        assert!(matches!(
            err,
            StorageError::UnsupportedSchema { supported: CURRENT_VERSION, .. }
        ));
    }
}
