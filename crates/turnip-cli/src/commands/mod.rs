//! CLI command implementations

pub mod apply;
pub mod completions;
pub mod config;
pub mod export;
pub mod replay;
pub mod resolve;
pub mod show;

use std::io::Read;
use std::path::Path;

use turnip_core::{Attributes, OperationOutcome};

/// Read a file argument, `-` meaning stdin
pub fn read_input(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut content = String::new();
        std::io::stdin().read_to_string(&mut content)?;
        return Ok(content);
    }
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read {}: {}", path.display(), e))
}

/// One-line description of an operation outcome
pub fn describe_outcome(outcome: &OperationOutcome) -> String {
    match outcome {
        OperationOutcome::Applied { nodes, edges } => {
            let mut parts = Vec::new();
            if !nodes.is_empty() {
                parts.push(format!("nodes {}", join_ids(nodes)));
            }
            if !edges.is_empty() {
                parts.push(format!("edges {}", join_ids(edges)));
            }
            format!("applied ({})", parts.join("; "))
        }
        OperationOutcome::NoOp { reason } => {
            let reason = serde_json::to_value(reason)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_else(|| format!("{:?}", reason));
            format!("no-op ({})", reason)
        }
    }
}

fn join_ids<T: std::fmt::Display>(ids: &[T]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// `key=value` pairs for table cells
pub fn format_attributes(attributes: &Attributes) -> String {
    attributes
        .iter()
        .map(|(k, v)| match v {
            serde_json::Value::String(s) => format!("{}={}", k, s),
            other => format!("{}={}", k, other),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use turnip_core::{EdgeId, NoOpReason, NodeId};

    #[test]
    fn test_describe_outcome() {
        let applied = OperationOutcome::Applied {
            nodes: vec![NodeId(1), NodeId(2)],
            edges: vec![EdgeId(4)],
        };
        assert_eq!(describe_outcome(&applied), "applied (nodes 1,2; edges 4)");
        assert_eq!(
            describe_outcome(&OperationOutcome::no_op(NoOpReason::UnknownEntity)),
            "no-op (unknown_entity)"
        );
    }

    #[test]
    fn test_format_attributes() {
        let mut attributes = Attributes::new();
        attributes.insert("age".into(), json!("30"));
        attributes.insert("tags".into(), json!(["a", "b"]));
        assert_eq!(format_attributes(&attributes), "age=30, tags=[\"a\",\"b\"]");
    }
}
