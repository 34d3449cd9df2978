//! Node (entity) types and operations

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Attribute map shared by nodes and edges, last write wins per key
pub type Attributes = BTreeMap<String, serde_json::Value>;

/// Process-assigned node identifier, never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Open-ended node classification (e.g. "Person", "Place")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeType(pub String);

impl NodeType {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Types compare case-insensitively ("person" and "PERSON" are one kind)
    pub fn matches(&self, other: &str) -> bool {
        self.0.trim().eq_ignore_ascii_case(other.trim())
    }
}

impl From<&str> for NodeType {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeType {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical form of a free-text mention: trimmed, inner whitespace collapsed.
pub fn normalize_mention(mention: &str) -> String {
    mention.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Case-folded key used for exact matching of mentions, labels and aliases.
pub fn mention_key(mention: &str) -> String {
    normalize_mention(mention).to_lowercase()
}

/// A node in the knowledge graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,

    /// Canonical display name (the first mention that created the node)
    pub label: String,

    /// Kind of entity, unset for nodes only ever seen as relation endpoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<NodeType>,

    /// Every name used to refer to this node, always including `label`
    pub aliases: BTreeSet<String>,

    #[serde(default)]
    pub attributes: Attributes,

    /// Version of the commit that created the node
    pub created_at: u64,

    /// Version of the commit that last changed the node
    pub updated_at: u64,
}

impl Node {
    /// Create a node whose only alias is its label
    pub fn new(id: NodeId, label: impl Into<String>, version: u64) -> Self {
        let label = label.into();
        let mut aliases = BTreeSet::new();
        aliases.insert(label.clone());
        Self {
            id,
            label,
            node_type: None,
            aliases,
            attributes: Attributes::new(),
            created_at: version,
            updated_at: version,
        }
    }

    pub fn with_type(mut self, node_type: impl Into<NodeType>) -> Self {
        self.node_type = Some(node_type.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Check whether `name` is the label or an alias, ignoring case
    pub fn is_known_as(&self, name: &str) -> bool {
        let key = mention_key(name);
        self.aliases.iter().any(|a| mention_key(a) == key)
    }

    /// Record another name for this node.
    ///
    /// Aliases are de-duplicated case-insensitively; returns true if the set grew.
    pub fn add_alias(&mut self, name: &str) -> bool {
        let name = normalize_mention(name);
        if name.is_empty() || self.is_known_as(&name) {
            return false;
        }
        self.aliases.insert(name)
    }

    /// Merge attributes last-write-wins; returns true if any value changed
    pub fn merge_attributes(&mut self, attributes: &Attributes) -> bool {
        merge_attributes(&mut self.attributes, attributes)
    }

    pub fn type_str(&self) -> Option<&str> {
        self.node_type.as_ref().map(NodeType::as_str)
    }
}

/// Last-write-wins merge of `incoming` into `target`; returns true on change.
pub fn merge_attributes(target: &mut Attributes, incoming: &Attributes) -> bool {
    let mut changed = false;
    for (key, value) in incoming {
        if target.get(key) != Some(value) {
            target.insert(key.clone(), value.clone());
            changed = true;
        }
    }
    changed
}
