//! Authoritative in-memory graph store
//!
//! Single writer, many readers. A commit builds the next snapshot beside the
//! current one and swaps it in only after every constraint holds, so readers
//! always see the last fully committed version and a failed commit leaves no
//! trace.

use std::sync::{Arc, Mutex, RwLock};

use crate::error::StorageResult;
use crate::traits::SnapshotPersistence;
use turnip_core::{
    Error, GraphSnapshot, Mutation, MutationSet, Result, Version, Violation,
};

/// In-memory graph with atomic commits and lock-light snapshots
pub struct GraphStore {
    current: RwLock<Arc<GraphSnapshot>>,
    writer: Mutex<()>,
}

impl GraphStore {
    /// An empty store at version 0
    pub fn new() -> Self {
        Self::from_trusted(GraphSnapshot::empty())
    }

    fn from_trusted(snapshot: GraphSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
            writer: Mutex::new(()),
        }
    }

    /// Start from an existing snapshot after checking its integrity
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Result<Self> {
        snapshot.check_integrity()?;
        Ok(Self::from_trusted(snapshot))
    }

    /// Load the last saved snapshot, or start empty if none was saved
    pub async fn load(persistence: &dyn SnapshotPersistence) -> StorageResult<Self> {
        match persistence.load().await? {
            Some(snapshot) => {
                snapshot.check_integrity()?;
                tracing::info!(
                    "Loaded graph at version {} ({} nodes, {} edges)",
                    snapshot.version(),
                    snapshot.node_count(),
                    snapshot.edge_count()
                );
                Ok(Self::from_trusted(snapshot))
            }
            None => {
                tracing::debug!("No saved graph found, starting empty");
                Ok(Self::new())
            }
        }
    }

    /// Current committed view. Never blocks on a commit in progress beyond
    /// the pointer swap.
    pub fn snapshot(&self) -> Arc<GraphSnapshot> {
        // The lock only guards an Arc swap, so a poisoned lock still holds
        // a complete snapshot.
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    pub fn version(&self) -> Version {
        self.snapshot().version()
    }

    /// Apply every mutation or none; returns the new version.
    ///
    /// Fails with [`Error::ConstraintViolation`] if the set was planned
    /// against another version or would leave the graph inconsistent.
    pub fn commit(&self, set: MutationSet) -> Result<Version> {
        let _writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());

        let base = self.snapshot();
        let next = match apply(&base, set) {
            Ok(next) => next,
            Err(violation) => {
                tracing::warn!(
                    "Commit rejected at version {}: {}",
                    base.version(),
                    violation
                );
                return Err(Error::ConstraintViolation(violation));
            }
        };

        let version = next.version();
        tracing::debug!(
            "Committed version {} ({} nodes, {} edges)",
            version,
            next.node_count(),
            next.edge_count()
        );

        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        *current = Arc::new(next);
        Ok(version)
    }

    /// Save the current snapshot through a persistence hook
    pub async fn save(&self, persistence: &dyn SnapshotPersistence) -> StorageResult<()> {
        let snapshot = self.snapshot();
        persistence.save(&snapshot).await
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the snapshot that results from applying `set` to `base`.
fn apply(base: &GraphSnapshot, set: MutationSet) -> std::result::Result<GraphSnapshot, Violation> {
    if set.base_version != base.version() {
        return Err(Violation::StaleSnapshot {
            planned: set.base_version,
            current: base.version(),
        });
    }

    let mut nodes = base.node_map().clone();
    let mut edges = base.edge_map().clone();
    let mut next_node_id = base.next_node_id().max(set.next_node_id);
    let mut next_edge_id = base.next_edge_id().max(set.next_edge_id);

    for mutation in set.mutations {
        match mutation {
            Mutation::InsertNode(node) => {
                if nodes.contains_key(&node.id) {
                    return Err(Violation::DuplicateNodeId(node.id));
                }
                if node.id.0 < base.next_node_id() {
                    return Err(Violation::ReusedId(node.id.0));
                }
                if !node.aliases.contains(&node.label) {
                    return Err(Violation::LabelNotAliased(node.id));
                }
                next_node_id = next_node_id.max(node.id.0 + 1);
                nodes.insert(node.id, node);
            }
            Mutation::UpdateNode(node) => {
                let previous = nodes.get(&node.id).ok_or(Violation::UnknownNode(node.id))?;
                if !previous.aliases.is_subset(&node.aliases) {
                    return Err(Violation::AliasesShrunk(node.id));
                }
                if !node.aliases.contains(&node.label) {
                    return Err(Violation::LabelNotAliased(node.id));
                }
                nodes.insert(node.id, node);
            }
            Mutation::RemoveNode(id) => {
                nodes.remove(&id).ok_or(Violation::UnknownNode(id))?;
            }
            Mutation::InsertEdge(edge) => {
                if edges.contains_key(&edge.id) {
                    return Err(Violation::DuplicateEdgeId(edge.id));
                }
                if edge.id.0 < base.next_edge_id() {
                    return Err(Violation::ReusedId(edge.id.0));
                }
                next_edge_id = next_edge_id.max(edge.id.0 + 1);
                edges.insert(edge.id, edge);
            }
            Mutation::UpdateEdge(edge) => {
                if !edges.contains_key(&edge.id) {
                    return Err(Violation::UnknownEdge(edge.id));
                }
                edges.insert(edge.id, edge);
            }
            Mutation::RemoveEdge(id) => {
                edges.remove(&id).ok_or(Violation::UnknownEdge(id))?;
            }
        }
    }

    let next = GraphSnapshot::from_parts(
        set.base_version + 1,
        next_node_id,
        next_edge_id,
        nodes,
        edges,
    );
    // Endpoint existence and edge-key uniqueness are whole-graph properties
    next.check_integrity()?;
    Ok(next)
}
