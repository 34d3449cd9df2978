//! One chat turn: extract, merge, render
//!
//! Extraction runs against the latest snapshot before the batch joins the
//! merge queue, so a slow model call never holds up other writers. A failed
//! turn is reported, not retried.

use std::sync::Arc;

use turnip_core::{Error, ExtractionAdapter, GraphSnapshot, RenderAdapter, Result};

use crate::engine::{MergeEngine, MergeReport};

/// Terminal outcome of one turn
#[derive(Debug)]
pub enum TurnOutcome<A> {
    /// The batch committed. `artifact` is `None` when no renderer is set or
    /// rendering failed.
    Applied {
        report: MergeReport,
        artifact: Option<A>,
    },
    ExtractionFailed(String),
    MergeFailed {
        operation: Option<usize>,
        reason: String,
    },
}

impl<A> TurnOutcome<A> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    pub fn report(&self) -> Option<&MergeReport> {
        match self {
            Self::Applied { report, .. } => Some(report),
            _ => None,
        }
    }
}

/// Renderer that produces nothing, for pipelines without a view
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRender;

impl RenderAdapter for NoRender {
    type Artifact = ();

    fn render(&self, _snapshot: &GraphSnapshot) -> Result<()> {
        Ok(())
    }
}

/// Extraction adapter, merge engine and optional renderer wired together
pub struct TurnPipeline<E, R = NoRender> {
    engine: Arc<MergeEngine>,
    extractor: E,
    renderer: Option<R>,
}

impl<E: ExtractionAdapter> TurnPipeline<E, NoRender> {
    pub fn new(engine: Arc<MergeEngine>, extractor: E) -> Self {
        Self {
            engine,
            extractor,
            renderer: None,
        }
    }
}

impl<E: ExtractionAdapter, R: RenderAdapter> TurnPipeline<E, R> {
    pub fn with_renderer<R2: RenderAdapter>(self, renderer: R2) -> TurnPipeline<E, R2> {
        TurnPipeline {
            engine: self.engine,
            extractor: self.extractor,
            renderer: Some(renderer),
        }
    }

    pub fn engine(&self) -> &Arc<MergeEngine> {
        &self.engine
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    /// Run one utterance through the pipeline
    pub async fn run_turn(&self, utterance: &str) -> TurnOutcome<R::Artifact> {
        let snapshot = self.engine.snapshot();

        let operations = match self.extractor.extract(utterance, &snapshot).await {
            Ok(operations) => operations,
            Err(e) => {
                let reason = match e {
                    Error::ExtractionFailed(reason) => reason,
                    other => other.to_string(),
                };
                tracing::warn!("Extraction failed at version {}: {}", snapshot.version(), reason);
                return TurnOutcome::ExtractionFailed(reason);
            }
        };
        tracing::debug!("Extracted {} operations", operations.len());

        let report = match self.engine.apply(&operations).await {
            Ok(report) => report,
            Err(Error::MergeFailed { operation, reason }) => {
                return TurnOutcome::MergeFailed { operation, reason }
            }
            Err(other) => {
                return TurnOutcome::MergeFailed {
                    operation: None,
                    reason: other.to_string(),
                }
            }
        };

        let artifact = self.renderer.as_ref().and_then(|renderer| {
            match renderer.render(&report.snapshot) {
                Ok(artifact) => Some(artifact),
                Err(e) => {
                    tracing::warn!("Render of version {} failed: {}", report.version, e);
                    None
                }
            }
        });

        TurnOutcome::Applied { report, artifact }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use turnip_core::{parse_operations, ProposedOperation};
    use turnip_storage::GraphStore;

    /// Treats the utterance itself as model output
    struct EchoExtractor;

    #[async_trait]
    impl ExtractionAdapter for EchoExtractor {
        async fn extract(
            &self,
            utterance: &str,
            _snapshot: &GraphSnapshot,
        ) -> Result<Vec<ProposedOperation>> {
            parse_operations(utterance)
        }
    }

    struct CountingRenderer;

    impl RenderAdapter for CountingRenderer {
        type Artifact = (usize, usize);

        fn render(&self, snapshot: &GraphSnapshot) -> Result<(usize, usize)> {
            Ok((snapshot.node_count(), snapshot.edge_count()))
        }
    }

    fn pipeline() -> TurnPipeline<EchoExtractor, CountingRenderer> {
        let engine = Arc::new(MergeEngine::with_default_resolver(Arc::new(GraphStore::new())));
        TurnPipeline::new(engine, EchoExtractor).with_renderer(CountingRenderer)
    }

    #[tokio::test]
    async fn test_turn_is_merged_and_rendered() {
        let pipeline = pipeline();
        let outcome = pipeline
            .run_turn(r#"[{"op": "add_or_update_relation", "source": "Alice", "relation": "knows", "target": "Bob"}]"#)
            .await;

        match outcome {
            TurnOutcome::Applied { report, artifact } => {
                assert_eq!(report.version, 1);
                assert_eq!(artifact, Some((2, 1)));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_output_is_extraction_failure() {
        let pipeline = pipeline();
        let outcome = pipeline.run_turn("I think Alice knows Bob").await;

        assert!(matches!(outcome, TurnOutcome::ExtractionFailed(_)));
        assert_eq!(pipeline.engine().snapshot().version(), 0);
    }

    #[tokio::test]
    async fn test_invalid_batch_is_merge_failure() {
        let pipeline = pipeline();
        let outcome = pipeline
            .run_turn(r#"{"operations": [{"op": "delete_entity", "mention": ""}]}"#)
            .await;

        match outcome {
            TurnOutcome::MergeFailed { operation, .. } => assert_eq!(operation, Some(0)),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(pipeline.engine().snapshot().version(), 0);
    }

    #[tokio::test]
    async fn test_pipeline_without_renderer() {
        let engine = Arc::new(MergeEngine::with_default_resolver(Arc::new(GraphStore::new())));
        let pipeline = TurnPipeline::new(engine, EchoExtractor);

        let outcome = pipeline
            .run_turn(r#"[{"op": "add_or_update_entity", "mention": "Alice", "type": "Person"}]"#)
            .await;
        assert!(outcome.is_applied());
        assert_eq!(outcome.report().map(|r| r.version), Some(1));
    }
}
