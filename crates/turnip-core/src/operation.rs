//! Operations proposed by the extraction model
//!
//! Every operation names entities by free-text mention, never by id. The
//! merge engine resolves mentions against the graph.

use crate::error::{Error, Result};
use crate::limits;
use crate::node::Attributes;
use serde::{Deserialize, Serialize};

/// One proposed change to the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ProposedOperation {
    AddOrUpdateEntity {
        mention: String,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        entity_type: Option<String>,
        #[serde(default)]
        attributes: Attributes,
        /// Replace an already-set type instead of keeping it
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        override_type: bool,
    },
    AddOrUpdateRelation {
        source: String,
        relation: String,
        target: String,
        #[serde(default)]
        attributes: Attributes,
    },
    DeleteEntity {
        mention: String,
    },
    DeleteRelation {
        source: String,
        relation: String,
        target: String,
    },
}

impl ProposedOperation {
    pub fn add_entity(mention: impl Into<String>, entity_type: Option<&str>) -> Self {
        Self::AddOrUpdateEntity {
            mention: mention.into(),
            entity_type: entity_type.map(str::to_string),
            attributes: Attributes::new(),
            override_type: false,
        }
    }

    pub fn add_relation(
        source: impl Into<String>,
        relation: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self::AddOrUpdateRelation {
            source: source.into(),
            relation: relation.into(),
            target: target.into(),
            attributes: Attributes::new(),
        }
    }

    pub fn delete_entity(mention: impl Into<String>) -> Self {
        Self::DeleteEntity {
            mention: mention.into(),
        }
    }

    pub fn delete_relation(
        source: impl Into<String>,
        relation: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self::DeleteRelation {
            source: source.into(),
            relation: relation.into(),
            target: target.into(),
        }
    }

    /// Set one attribute. No effect on delete operations.
    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        match &mut self {
            Self::AddOrUpdateEntity { attributes, .. }
            | Self::AddOrUpdateRelation { attributes, .. } => {
                attributes.insert(key.into(), value);
            }
            Self::DeleteEntity { .. } | Self::DeleteRelation { .. } => {}
        }
        self
    }

    /// Mark an entity operation as replacing any existing type
    pub fn overriding_type(mut self) -> Self {
        if let Self::AddOrUpdateEntity { override_type, .. } = &mut self {
            *override_type = true;
        }
        self
    }

    /// Short name for logs and reports
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AddOrUpdateEntity { .. } => "add_or_update_entity",
            Self::AddOrUpdateRelation { .. } => "add_or_update_relation",
            Self::DeleteEntity { .. } => "delete_entity",
            Self::DeleteRelation { .. } => "delete_relation",
        }
    }

    /// Check mentions, relation label and attributes against input limits
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::AddOrUpdateEntity {
                mention,
                entity_type,
                attributes,
                ..
            } => {
                limits::validate_mention(mention)?;
                if let Some(t) = entity_type {
                    limits::validate_type(t)?;
                }
                limits::validate_attributes(attributes)
            }
            Self::AddOrUpdateRelation {
                source,
                relation,
                target,
                attributes,
            } => {
                limits::validate_mention(source)?;
                limits::validate_relation(relation)?;
                limits::validate_mention(target)?;
                limits::validate_attributes(attributes)
            }
            Self::DeleteEntity { mention } => limits::validate_mention(mention),
            Self::DeleteRelation {
                source,
                relation,
                target,
            } => {
                limits::validate_mention(source)?;
                limits::validate_relation(relation)?;
                limits::validate_mention(target)
            }
        }
    }
}

impl std::fmt::Display for ProposedOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AddOrUpdateEntity {
                mention,
                entity_type,
                ..
            } => match entity_type {
                Some(t) => write!(f, "upsert entity '{}' ({})", mention, t),
                None => write!(f, "upsert entity '{}'", mention),
            },
            Self::AddOrUpdateRelation {
                source,
                relation,
                target,
                ..
            } => write!(f, "upsert relation '{}' -[{}]-> '{}'", source, relation, target),
            Self::DeleteEntity { mention } => write!(f, "delete entity '{}'", mention),
            Self::DeleteRelation {
                source,
                relation,
                target,
            } => write!(f, "delete relation '{}' -[{}]-> '{}'", source, relation, target),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OperationsDocument {
    List(Vec<ProposedOperation>),
    Wrapped { operations: Vec<ProposedOperation> },
}

/// Structurally validate raw model output into operations.
///
/// Accepts either a JSON array of operations or an object with an
/// `operations` array. Anything else is an extraction failure.
pub fn parse_operations(json: &str) -> Result<Vec<ProposedOperation>> {
    let document: OperationsDocument = serde_json::from_str(json)
        .map_err(|e| Error::ExtractionFailed(format!("malformed operations: {}", e)))?;
    let operations = match document {
        OperationsDocument::List(ops) => ops,
        OperationsDocument::Wrapped { operations } => operations,
    };
    tracing::debug!("Parsed {} proposed operations", operations.len());
    Ok(operations)
}
