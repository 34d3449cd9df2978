//! Property tests for the merge engine over random batches

use std::sync::Arc;

use proptest::prelude::*;
use serde_json::json;
use turnip_core::{GraphSnapshot, ProposedOperation};
use turnip_merge::MergeEngine;
use turnip_storage::GraphStore;

const NAMES: &[&str] = &["Alice", "Bob", "Carol", "Dave", "Erin"];
const RELATIONS: &[&str] = &["knows", "likes", "works_with"];
const TYPES: &[&str] = &["Person", "Place"];

fn mention() -> impl Strategy<Value = String> {
    (prop::sample::select(NAMES), any::<bool>()).prop_map(|(name, shout)| {
        if shout {
            name.to_uppercase()
        } else {
            name.to_string()
        }
    })
}

fn upsert() -> impl Strategy<Value = ProposedOperation> {
    prop_oneof![
        (
            mention(),
            prop::option::of(prop::sample::select(TYPES)),
            prop::option::of(0u8..3),
        )
            .prop_map(|(m, t, mood)| {
                let op = ProposedOperation::add_entity(m, t);
                match mood {
                    Some(mood) => op.with_attribute("mood", json!(mood)),
                    None => op,
                }
            }),
        (mention(), prop::sample::select(RELATIONS), mention())
            .prop_map(|(s, r, t)| ProposedOperation::add_relation(s, r, t)),
    ]
}

fn operation() -> impl Strategy<Value = ProposedOperation> {
    prop_oneof![
        3 => upsert(),
        1 => mention().prop_map(ProposedOperation::delete_entity),
        1 => (mention(), prop::sample::select(RELATIONS), mention())
            .prop_map(|(s, r, t)| ProposedOperation::delete_relation(s, r, t)),
    ]
}

fn batch() -> impl Strategy<Value = Vec<ProposedOperation>> {
    prop::collection::vec(operation(), 0..8)
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

fn engine() -> MergeEngine {
    MergeEngine::with_default_resolver(Arc::new(GraphStore::new()))
}

fn assert_no_dangling_edges(snapshot: &GraphSnapshot) {
    for edge in snapshot.edges() {
        assert!(snapshot.contains_node(edge.source_id), "dangling source in {:?}", edge);
        assert!(snapshot.contains_node(edge.target_id), "dangling target in {:?}", edge);
    }
    assert!(snapshot.check_integrity().is_ok());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn upsert_batches_are_idempotent(
        setup in batch(),
        ops in prop::collection::vec(upsert(), 1..8),
    ) {
        runtime().block_on(async {
            let engine = engine();
            engine.apply(&setup).await.unwrap();

            engine.apply(&ops).await.unwrap();
            let first = engine.snapshot();

            let report = engine.apply(&ops).await.unwrap();
            let second = engine.snapshot();

            assert!(report.diff.is_empty(), "second application changed {:?}", report.diff);
            assert_eq!(second.node_map(), first.node_map());
            assert_eq!(second.edge_map(), first.edge_map());
        });
    }

    #[test]
    fn aliases_never_shrink(batches in prop::collection::vec(batch(), 1..6)) {
        runtime().block_on(async {
            let engine = engine();
            for ops in &batches {
                let before = engine.snapshot();
                engine.apply(ops).await.unwrap();
                let after = engine.snapshot();

                for node in before.nodes() {
                    if let Some(current) = after.node(node.id) {
                        assert!(node.aliases.is_subset(&current.aliases));
                        assert_eq!(current.label, node.label);
                    }
                }
            }
        });
    }

    #[test]
    fn committed_snapshots_have_no_dangling_edges(batches in prop::collection::vec(batch(), 1..6)) {
        runtime().block_on(async {
            let engine = engine();
            for ops in &batches {
                let report = engine.apply(ops).await.unwrap();
                assert_no_dangling_edges(&report.snapshot);
            }
        });
    }

    #[test]
    fn version_advances_by_one_per_commit(
        batches in prop::collection::vec((batch(), any::<bool>()), 1..6),
    ) {
        runtime().block_on(async {
            let engine = engine();
            for (ops, poison) in &batches {
                let before = engine.snapshot();
                let mut ops = ops.clone();
                if *poison {
                    ops.push(ProposedOperation::add_entity("", None));
                }

                match engine.apply(&ops).await {
                    Ok(report) => {
                        assert!(!poison);
                        assert_eq!(report.version, before.version() + 1);
                        assert_eq!(report.outcomes.len(), ops.len());
                    }
                    Err(e) => {
                        assert!(*poison);
                        assert!(e.is_merge_failed());
                        let after = engine.snapshot();
                        assert_eq!(after.version(), before.version());
                        assert_eq!(*after, *before);
                    }
                }
            }
        });
    }
}
