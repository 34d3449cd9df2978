//! Interfaces of the collaborators around the merge engine

use crate::error::Result;
use crate::operation::ProposedOperation;
use crate::snapshot::GraphSnapshot;
use async_trait::async_trait;

/// Turns one utterance into proposed operations.
///
/// Implementations usually call a language model and are slow; they run
/// before a batch reaches the merge engine, never while it holds the write
/// lock. Malformed model output must be rejected here as
/// [`Error::ExtractionFailed`](crate::Error::ExtractionFailed).
#[async_trait]
pub trait ExtractionAdapter: Send + Sync {
    async fn extract(
        &self,
        utterance: &str,
        snapshot: &GraphSnapshot,
    ) -> Result<Vec<ProposedOperation>>;
}

/// Produces a visual artifact from a snapshot.
///
/// Renderers only see public node and edge fields.
pub trait RenderAdapter: Send + Sync {
    type Artifact: Send;

    fn render(&self, snapshot: &GraphSnapshot) -> Result<Self::Artifact>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::parse_operations;

    /// Extractor that echoes the utterance back as operation JSON
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

    struct CountRenderer;

    impl RenderAdapter for CountRenderer {
        type Artifact = usize;

        fn render(&self, snapshot: &GraphSnapshot) -> Result<usize> {
            Ok(snapshot.node_count())
        }
    }

    #[tokio::test]
    async fn test_extraction_adapter_contract() {
        let snapshot = GraphSnapshot::empty();
        let ops = EchoExtractor
            .extract(r#"[{"op": "delete_entity", "mention": "Carol"}]"#, &snapshot)
            .await
            .unwrap();
        assert_eq!(ops.len(), 1);

        let err = EchoExtractor.extract("{", &snapshot).await.unwrap_err();
        assert!(matches!(err, crate::Error::ExtractionFailed(_)));
    }

    #[test]
    fn test_render_adapter_contract() {
        assert_eq!(CountRenderer.render(&GraphSnapshot::empty()).unwrap(), 0);
    }
}
