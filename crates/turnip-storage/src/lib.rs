//! Turnip Storage - Graph store and persistence hooks
//!
//! [`GraphStore`] is the authoritative in-memory graph: readers take
//! immutable snapshots, a single writer commits validated mutation sets
//! all-or-nothing. Persistence backends load and save whole snapshots.

#![allow(clippy::result_large_err)]

pub mod error;
pub mod file;
pub mod memory;
pub mod migration;
pub mod store;
pub mod traits;

#[cfg(feature = "redb")]
pub mod redb;

pub use error::{StorageError, StorageResult};
pub use file::JsonFilePersistence;
pub use memory::MemoryPersistence;
pub use migration::{Migratable, PersistedGraph, SchemaVersion, CURRENT_VERSION};
pub use store::GraphStore;
pub use traits::SnapshotPersistence;

#[cfg(feature = "redb")]
pub use redb::RedbPersistence;
