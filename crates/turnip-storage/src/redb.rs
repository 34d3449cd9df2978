//! ReDB persistence backend

use crate::error::{StorageError, StorageResult};
use crate::migration::{Migratable, PersistedGraph, CURRENT_VERSION};
use crate::traits::SnapshotPersistence;
use async_trait::async_trait;
use redb::{Database, ReadableTable, TableDefinition};
use std::path::Path;
use turnip_core::GraphSnapshot;

// Table definitions
const SNAPSHOTS: TableDefinition<&str, &[u8]> = TableDefinition::new("snapshots");
const META: TableDefinition<&str, u32> = TableDefinition::new("meta");

const SCHEMA_VERSION_KEY: &str = "schema_version";

/// ReDB persistence backend
///
/// One database file can hold several named graphs; each save replaces the
/// graph's row in a single write transaction.
pub struct RedbPersistence {
    db: Database,
    graph: String,
}

impl RedbPersistence {
    /// Open or create a ReDB database at the given path
    pub fn open(path: impl AsRef<Path>, graph: impl Into<String>) -> StorageResult<Self> {
        let db = Database::create(path)?;

        // Initialize tables
        {
            let write_txn = db.begin_write()?;
            {
                write_txn.open_table(SNAPSHOTS)?;
                let mut meta = write_txn.open_table(META)?;
                if meta.get(SCHEMA_VERSION_KEY)?.is_none() {
                    meta.insert(SCHEMA_VERSION_KEY, CURRENT_VERSION)?;
                }
            }
            write_txn.commit()?;
        }

        let persistence = Self {
            db,
            graph: graph.into(),
        };
        persistence.migrate_to_latest()?;
        Ok(persistence)
    }

    pub fn graph(&self) -> &str {
        &self.graph
    }

    /// Names of all graphs stored in this database
    pub fn graphs(&self) -> StorageResult<Vec<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SNAPSHOTS)?;

        let mut names = Vec::new();
        for entry in table.iter()? {
            let (key, _) = entry?;
            names.push(key.value().to_string());
        }
        Ok(names)
    }
}

impl Migratable for RedbPersistence {
    fn get_schema_version(&self) -> StorageResult<u32> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(META)?;
        let version = table
            .get(SCHEMA_VERSION_KEY)?
            .map(|v| v.value())
            .unwrap_or(CURRENT_VERSION);
        Ok(version)
    }

    fn set_schema_version(&self, version: u32) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(META)?;
            table.insert(SCHEMA_VERSION_KEY, version)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn run_migration(&self, version: u32) -> StorageResult<()> {
        match version {
            1 => Ok(()),
            other => Err(StorageError::Migration(format!(
                "no migration defined for schema v{}",
                other
            ))),
        }
    }
}

#[async_trait]
impl SnapshotPersistence for RedbPersistence {
    async fn load(&self) -> StorageResult<Option<GraphSnapshot>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SNAPSHOTS)?;

        let snapshot = match table.get(self.graph.as_str())? {
            Some(value) => Some(PersistedGraph::decode(value.value())?.snapshot),
            None => None,
        };
        Ok(snapshot)
    }

    async fn save(&self, snapshot: &GraphSnapshot) -> StorageResult<()> {
        let value = PersistedGraph::new(snapshot.clone()).encode()?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SNAPSHOTS)?;
            table.insert(self.graph.as_str(), value.as_slice())?;
        }
        write_txn.commit()?;

        tracing::debug!("Saved graph '{}' at version {}", self.graph, snapshot.version());
        Ok(())
    }

    async fn health_check(&self) -> StorageResult<bool> {
        Ok(self.get_schema_version()? == CURRENT_VERSION)
    }
}
