//! Merge engine
//!
//! Batches are planned and committed one at a time. Callers queue on a fair
//! async mutex, so concurrent requests are applied strictly in arrival order
//! and never interleave. Once a batch holds the gate, planning and commit run
//! synchronously to completion; dropping the future while it waits in the
//! queue leaves the store untouched.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use turnip_core::{
    limits, Diff, GraphSnapshot, OperationOutcome, ProposedOperation, Result, Version,
};
use turnip_resolve::{EntityResolver, Resolve};
use turnip_storage::GraphStore;

use crate::plan::plan_batch;

/// Merge engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_max_batch_operations")]
    pub max_batch_operations: usize,
}

fn default_max_batch_operations() -> usize {
    limits::MAX_BATCH_OPERATIONS
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_batch_operations: default_max_batch_operations(),
        }
    }
}

/// Result of one committed batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeReport {
    /// Version the batch committed as
    pub version: Version,
    pub diff: Diff,
    /// One entry per input operation, in input order
    pub outcomes: Vec<OperationOutcome>,
    /// The snapshot this batch produced
    #[serde(skip)]
    pub snapshot: Arc<GraphSnapshot>,
}

impl MergeReport {
    pub fn applied_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_applied()).count()
    }
}

/// Turns proposed operations into committed graph versions
pub struct MergeEngine {
    store: Arc<GraphStore>,
    resolver: Arc<dyn Resolve>,
    config: EngineConfig,
    gate: Mutex<()>,
}

impl MergeEngine {
    pub fn new(store: Arc<GraphStore>, resolver: Arc<dyn Resolve>) -> Self {
        Self {
            store,
            resolver,
            config: EngineConfig::default(),
            gate: Mutex::new(()),
        }
    }

    /// Engine over `store` with the default resolver
    pub fn with_default_resolver(store: Arc<GraphStore>) -> Self {
        Self::new(store, Arc::new(EntityResolver::default()))
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(&self) -> &Arc<GraphStore> {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Last committed snapshot; never waits for a batch in progress
    pub fn snapshot(&self) -> Arc<GraphSnapshot> {
        self.store.snapshot()
    }

    /// Merge one batch atomically.
    ///
    /// Any invalid operation or rejected commit fails the whole batch with
    /// `MergeFailed` and leaves the graph at its previous version.
    pub async fn apply(&self, operations: &[ProposedOperation]) -> Result<MergeReport> {
        let _turn = self.gate.lock().await;
        self.apply_exclusive(operations)
    }

    fn apply_exclusive(&self, operations: &[ProposedOperation]) -> Result<MergeReport> {
        let base = self.store.snapshot();

        let result = self.check_size(operations.len()).and_then(|_| {
            let planned = plan_batch(operations, &base, self.resolver.as_ref())?;
            let version = self
                .store
                .commit(planned.mutations)
                .map_err(|e| e.into_merge_failed(None))?;
            Ok(MergeReport {
                version,
                diff: planned.diff,
                outcomes: planned.outcomes,
                snapshot: self.store.snapshot(),
            })
        });

        match &result {
            Ok(report) => tracing::info!(
                "Merged {} operations into version {} ({})",
                operations.len(),
                report.version,
                report.diff.summary()
            ),
            Err(e) => tracing::warn!(
                "Batch of {} operations aborted at version {}: {}",
                operations.len(),
                base.version(),
                e
            ),
        }
        result
    }

    fn check_size(&self, count: usize) -> Result<()> {
        limits::validate_batch_size(count)?;
        if count > self.config.max_batch_operations {
            return Err(turnip_core::Error::MergeFailed {
                operation: None,
                reason: format!(
                    "too many operations in batch: {} (max {})",
                    count, self.config.max_batch_operations
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use turnip_core::{EdgeId, Error, NoOpReason, NodeId};

    fn engine() -> MergeEngine {
        MergeEngine::with_default_resolver(Arc::new(GraphStore::new()))
    }

    #[tokio::test]
    async fn test_repeated_mention_in_one_batch() {
        let engine = engine();
        let report = engine
            .apply(&[
                ProposedOperation::add_entity("Alice", Some("Person")),
                ProposedOperation::add_entity("Alice", Some("Person"))
                    .with_attribute("age", json!("30")),
            ])
            .await
            .unwrap();

        assert_eq!(report.version, 1);
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.node_count(), 1);
        let alice = snapshot.nodes_named("Alice")[0];
        assert_eq!(alice.label, "Alice");
        assert_eq!(alice.attributes.len(), 1);
        assert_eq!(alice.attributes["age"], json!("30"));
    }

    #[tokio::test]
    async fn test_relation_on_empty_graph() {
        let engine = engine();
        let report = engine
            .apply(&[ProposedOperation::add_relation("Alice", "knows", "Bob")])
            .await
            .unwrap();

        assert_eq!(report.diff.nodes_added.len(), 2);
        assert_eq!(report.diff.edges_added.len(), 1);

        let snapshot = engine.snapshot();
        let alice = snapshot.nodes_named("Alice")[0].id;
        let bob = snapshot.nodes_named("Bob")[0].id;
        let edge = snapshot.edges().next().unwrap();
        assert_eq!((edge.source_id, edge.relation.as_str(), edge.target_id), (alice, "knows", bob));
    }

    #[tokio::test]
    async fn test_deleting_absent_entity_is_a_no_op() {
        let engine = engine();
        engine
            .apply(&[ProposedOperation::add_entity("Alice", Some("Person"))])
            .await
            .unwrap();

        let report = engine
            .apply(&[ProposedOperation::delete_entity("Carol")])
            .await
            .unwrap();
        assert!(report.diff.is_empty());
        assert_eq!(
            report.outcomes,
            vec![OperationOutcome::no_op(NoOpReason::UnknownEntity)]
        );
        assert_eq!(report.version, 2);
        assert_eq!(engine.snapshot().node_count(), 1);
    }

    #[tokio::test]
    async fn test_mentions_match_case_insensitively_across_batches() {
        let engine = engine();
        engine
            .apply(&[ProposedOperation::add_entity("Alice", Some("Person"))])
            .await
            .unwrap();

        engine
            .apply(&[ProposedOperation::add_entity("Alice", None).with_attribute("city", json!("Oslo"))])
            .await
            .unwrap();
        engine
            .apply(&[ProposedOperation::add_entity("alice", None).with_attribute("age", json!("30"))])
            .await
            .unwrap();

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.node_count(), 1);
        let alice = snapshot.node(NodeId(1)).unwrap();
        assert_eq!(alice.attributes["city"], json!("Oslo"));
        assert_eq!(alice.attributes["age"], json!("30"));
        assert_eq!(alice.aliases.len(), 1);
    }

    #[tokio::test]
    async fn test_ambiguous_mention_creates_distinct_node() {
        let engine = engine();
        engine
            .apply(&[
                ProposedOperation::add_entity("Jon Smithson", Some("Person")),
                ProposedOperation::add_entity("Jan Smithson", Some("Person")),
            ])
            .await
            .unwrap();

        // Equally close to both existing people: never merged into either
        let report = engine
            .apply(&[ProposedOperation::add_entity("Jen Smithson", Some("Person"))])
            .await
            .unwrap();

        assert_eq!(report.diff.nodes_added, vec![NodeId(3)]);
        assert!(report.diff.nodes_updated.is_empty());
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.node_count(), 3);
        assert_eq!(snapshot.node(NodeId(1)).unwrap().aliases.len(), 1);
        assert_eq!(snapshot.node(NodeId(2)).unwrap().aliases.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_batch_leaves_graph_untouched() {
        let engine = engine();
        engine
            .apply(&[ProposedOperation::add_relation("Alice", "knows", "Bob")])
            .await
            .unwrap();
        let before = engine.snapshot();

        let err = engine
            .apply(&[
                ProposedOperation::add_entity("Carol", Some("Person")),
                ProposedOperation::delete_entity("Bob"),
                ProposedOperation::add_entity("   ", None),
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, Error::MergeFailed { operation: Some(2), .. }));
        let after = engine.snapshot();
        assert_eq!(after.version(), before.version());
        assert_eq!(*after, *before);
    }

    /// Resolver that lets another writer commit while the batch is planning
    struct InterleavingResolver {
        store: Arc<GraphStore>,
        interfered: std::sync::Mutex<bool>,
        inner: EntityResolver,
    }

    impl Resolve for InterleavingResolver {
        fn resolve(
            &self,
            mention: &str,
            type_hint: Option<&str>,
            snapshot: &GraphSnapshot,
        ) -> Result<turnip_resolve::Resolution> {
            let mut interfered = self.interfered.lock().unwrap();
            if !*interfered {
                *interfered = true;
                let set = turnip_core::MutationSet::against(&self.store.snapshot());
                self.store.commit(set).unwrap();
            }
            self.inner.resolve(mention, type_hint, snapshot)
        }
    }

    #[tokio::test]
    async fn test_stale_commit_fails_batch_without_effect() {
        let store = Arc::new(GraphStore::new());
        let resolver = Arc::new(InterleavingResolver {
            store: store.clone(),
            interfered: std::sync::Mutex::new(false),
            inner: EntityResolver::default(),
        });
        let engine = MergeEngine::new(store.clone(), resolver);

        let err = engine
            .apply(&[ProposedOperation::add_relation("Alice", "knows", "Bob")])
            .await
            .unwrap_err();

        match err {
            Error::MergeFailed { operation, reason } => {
                assert_eq!(operation, None);
                assert!(reason.contains("planned against version 0"), "{}", reason);
            }
            other => panic!("unexpected error {:?}", other),
        }
        // Only the interleaved empty commit landed
        let snapshot = store.snapshot();
        assert_eq!(snapshot.version(), 1);
        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn test_same_batch_twice_is_idempotent() {
        let engine = engine();
        let batch = vec![
            ProposedOperation::add_entity("Alice", Some("Person")).with_attribute("age", json!("30")),
            ProposedOperation::add_relation("Alice", "works_at", "Acme"),
            ProposedOperation::add_entity("Acme", Some("Organization")),
        ];

        engine.apply(&batch).await.unwrap();
        let first = engine.snapshot();

        let report = engine.apply(&batch).await.unwrap();
        let second = engine.snapshot();

        assert!(report.diff.is_empty());
        assert!(report.outcomes.iter().all(|o| !o.is_applied()));
        assert_eq!(second.version(), first.version() + 1);
        assert_eq!(second.node_map(), first.node_map());
        assert_eq!(second.edge_map(), first.edge_map());
    }

    #[tokio::test]
    async fn test_delete_then_readd_uses_new_ids() {
        let engine = engine();
        engine
            .apply(&[ProposedOperation::add_relation("Alice", "knows", "Bob")])
            .await
            .unwrap();
        engine
            .apply(&[ProposedOperation::delete_entity("bob")])
            .await
            .unwrap();

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.node_count(), 1);
        assert_eq!(snapshot.edge_count(), 0);

        let report = engine
            .apply(&[ProposedOperation::add_relation("Alice", "knows", "Bob")])
            .await
            .unwrap();
        assert_eq!(report.diff.nodes_added, vec![NodeId(3)]);
        assert_eq!(report.diff.edges_added, vec![EdgeId(2)]);
    }

    #[tokio::test]
    async fn test_batch_size_limit() {
        let engine = engine().with_config(EngineConfig {
            max_batch_operations: 2,
        });
        let batch: Vec<_> = ["A1", "A2", "A3"]
            .iter()
            .map(|m| ProposedOperation::add_entity(*m, None))
            .collect();

        let err = engine.apply(&batch).await.unwrap_err();
        assert!(matches!(err, Error::MergeFailed { operation: None, .. }));
        assert_eq!(engine.snapshot().version(), 0);
    }

    #[tokio::test]
    async fn test_report_snapshot_matches_committed_version() {
        let engine = engine();
        let report = engine
            .apply(&[ProposedOperation::add_entity("Alice", None)])
            .await
            .unwrap();
        assert_eq!(report.snapshot.version(), report.version);
        assert_eq!(report.applied_count(), 1);
    }

    #[tokio::test]
    async fn test_abandoned_batch_has_no_effect() {
        let engine = engine();
        let batch = [ProposedOperation::add_entity("Alice", None)];

        let pending = engine.apply(&batch);
        drop(pending);

        assert_eq!(engine.snapshot().version(), 0);
        assert!(engine.snapshot().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_batches_are_serialized() {
        let engine = Arc::new(engine());

        let names = [
            "Alice", "Bob", "Carol", "Dave", "Erin", "Frank", "Grace", "Heidi", "Ivan", "Judy",
            "Mallory", "Niaj", "Olivia", "Peggy", "Rupert", "Sybil",
        ];

        let mut handles = Vec::new();
        for name in names {
            let engine = Arc::clone(&engine);
            handles.push(tokio::spawn(async move {
                engine
                    .apply(&[
                        ProposedOperation::add_entity(name, Some("Person")),
                        ProposedOperation::add_relation(name, "member_of", "Club"),
                    ])
                    .await
                    .unwrap()
                    .version
            }));
        }

        let mut versions = Vec::new();
        for handle in handles {
            versions.push(handle.await.unwrap());
        }
        versions.sort_unstable();
        assert_eq!(versions, (1..=16).collect::<Vec<_>>());

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.version(), 16);
        assert_eq!(snapshot.nodes_named("Club").len(), 1);
        assert_eq!(snapshot.edge_count(), 16);
        assert!(snapshot.check_integrity().is_ok());
    }

    #[tokio::test]
    async fn test_queued_batches_apply_in_arrival_order() {
        let engine = Arc::new(engine());

        // Hold the gate so both requests queue up behind it
        let gate = engine.gate.lock().await;
        let first = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                engine
                    .apply(&[ProposedOperation::add_entity("Alice", Some("Person"))])
                    .await
            })
        };
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let second = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                engine
                    .apply(&[ProposedOperation::add_entity("Alice", Some("Robot")).overriding_type()])
                    .await
            })
        };
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        drop(gate);

        assert_eq!(first.await.unwrap().unwrap().version, 1);
        assert_eq!(second.await.unwrap().unwrap().version, 2);
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.node(NodeId(1)).unwrap().type_str(), Some("Robot"));
    }
}
