//! Storage error types

use thiserror::Error;

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Failures while loading or saving snapshots
#[derive(Error, Debug)]
pub enum StorageError {
    /// A backend lock was poisoned by a panicking writer
    #[error("Persistence lock poisoned: {0}")]
    Poisoned(String),

    #[error("Snapshot encoding error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Saved graph has no schema_version; not a turnip snapshot")]
    MissingSchemaVersion,

    #[error("Saved graph uses schema v{found}, this build reads up to v{supported}")]
    UnsupportedSchema { found: u64, supported: u32 },

    #[error("Migration error: {0}")]
    Migration(String),

    /// The saved graph decoded but breaks a graph invariant
    #[error("Corrupt snapshot: {0}")]
    Integrity(#[from] turnip_core::Violation),

    #[cfg(feature = "redb")]
    #[error("ReDB error: {0}")]
    Redb(#[from] ::redb::Error),

    #[cfg(feature = "redb")]
    #[error("ReDB database error: {0}")]
    RedbDatabase(#[from] ::redb::DatabaseError),

    #[cfg(feature = "redb")]
    #[error("ReDB table error: {0}")]
    RedbTable(#[from] ::redb::TableError),

    #[cfg(feature = "redb")]
    #[error("ReDB storage error: {0}")]
    RedbStorage(#[from] ::redb::StorageError),

    #[cfg(feature = "redb")]
    #[error("ReDB commit error: {0}")]
    RedbCommit(#[from] ::redb::CommitError),

    #[cfg(feature = "redb")]
    #[error("ReDB transaction error: {0}")]
    RedbTransaction(#[from] ::redb::TransactionError),
}
