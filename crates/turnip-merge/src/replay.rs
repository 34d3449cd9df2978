//! Extraction adapter that replays recorded model output

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use turnip_core::{
    parse_operations, Error, ExtractionAdapter, GraphSnapshot, ProposedOperation, Result,
};

enum Recorded {
    Operations(Vec<ProposedOperation>),
    /// Raw model output, validated only when its turn comes up
    Raw(String),
}

/// Serves recorded batches in order, one per `extract` call.
///
/// A recording is a JSON array with one entry per turn. Each entry is an
/// operations array or an object `{"utterance": "...", "operations": [...]}`.
/// A malformed entry fails only its own turn.
pub struct ReplayExtractor {
    utterances: Vec<String>,
    turns: Mutex<VecDeque<Recorded>>,
}

impl ReplayExtractor {
    pub fn new(batches: Vec<Vec<ProposedOperation>>) -> Self {
        let utterances = (1..=batches.len()).map(|i| format!("turn {}", i)).collect();
        Self {
            utterances,
            turns: Mutex::new(batches.into_iter().map(Recorded::Operations).collect()),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<Value> = serde_json::from_str(json)
            .map_err(|e| Error::ExtractionFailed(format!("malformed recording: {}", e)))?;

        let mut utterances = Vec::with_capacity(entries.len());
        let mut turns = VecDeque::with_capacity(entries.len());
        for (i, entry) in entries.into_iter().enumerate() {
            let utterance = entry
                .get("utterance")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("turn {}", i + 1));
            utterances.push(utterance);
            turns.push_back(Recorded::Raw(entry.to_string()));
        }

        tracing::debug!("Loaded recording with {} turns", turns.len());
        Ok(Self {
            utterances,
            turns: Mutex::new(turns),
        })
    }

    /// Utterance of every recorded turn, in order
    pub fn utterances(&self) -> &[String] {
        &self.utterances
    }

    /// Turns not yet served
    pub fn remaining(&self) -> usize {
        self.turns.lock().map(|t| t.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ExtractionAdapter for ReplayExtractor {
    async fn extract(
        &self,
        _utterance: &str,
        _snapshot: &GraphSnapshot,
    ) -> Result<Vec<ProposedOperation>> {
        let next = self
            .turns
            .lock()
            .map_err(|_| Error::ExtractionFailed("Lock error".to_string()))?
            .pop_front();

        match next {
            Some(Recorded::Operations(operations)) => Ok(operations),
            Some(Recorded::Raw(json)) => parse_operations(&json),
            None => Err(Error::ExtractionFailed(
                "recording has no turns left".to_string(),
            )),
        }
    }
}
