//! Input validation limits for proposed operations

use crate::error::{Error, Result};
use crate::node::{normalize_mention, Attributes};

/// Maximum length for a mention (256 chars)
pub const MAX_MENTION_LEN: usize = 256;

/// Maximum length for a relation label (128 chars)
pub const MAX_RELATION_LEN: usize = 128;

/// Maximum length for a node type (64 chars)
pub const MAX_TYPE_LEN: usize = 64;

/// Maximum attributes carried by one operation (64)
pub const MAX_ATTRIBUTES_PER_OPERATION: usize = 64;

/// Maximum attribute key length (64 chars)
pub const MAX_ATTRIBUTE_KEY_LEN: usize = 64;

/// Maximum operations in a single batch (500)
pub const MAX_BATCH_OPERATIONS: usize = 500;

/// Validate a free-text mention
pub fn validate_mention(mention: &str) -> Result<()> {
    let normalized = normalize_mention(mention);
    if normalized.is_empty() {
        return Err(Error::InvalidMention("mention cannot be empty".to_string()));
    }
    let len = normalized.chars().count();
    if len > MAX_MENTION_LEN {
        return Err(Error::InvalidMention(format!(
            "mention too long: {} chars (max {})",
            len, MAX_MENTION_LEN
        )));
    }
    Ok(())
}

/// Validate a relation label
pub fn validate_relation(relation: &str) -> Result<()> {
    let normalized = normalize_mention(relation);
    if normalized.is_empty() {
        return Err(Error::InvalidRelation("relation cannot be empty".to_string()));
    }
    let len = normalized.chars().count();
    if len > MAX_RELATION_LEN {
        return Err(Error::InvalidRelation(format!(
            "relation too long: {} chars (max {})",
            len, MAX_RELATION_LEN
        )));
    }
    Ok(())
}

/// Validate a node type hint
pub fn validate_type(node_type: &str) -> Result<()> {
    let len = node_type.trim().chars().count();
    if len > MAX_TYPE_LEN {
        return Err(Error::InvalidMention(format!(
            "type too long: {} chars (max {})",
            len, MAX_TYPE_LEN
        )));
    }
    Ok(())
}

/// Validate an attribute map
pub fn validate_attributes(attributes: &Attributes) -> Result<()> {
    if attributes.len() > MAX_ATTRIBUTES_PER_OPERATION {
        return Err(Error::InvalidAttributes(format!(
            "too many attributes: {} (max {})",
            attributes.len(),
            MAX_ATTRIBUTES_PER_OPERATION
        )));
    }
    for key in attributes.keys() {
        if key.trim().is_empty() {
            return Err(Error::InvalidAttributes("attribute key cannot be empty".to_string()));
        }
        let len = key.chars().count();
        if len > MAX_ATTRIBUTE_KEY_LEN {
            return Err(Error::InvalidAttributes(format!(
                "attribute key too long: {} chars (max {})",
                len, MAX_ATTRIBUTE_KEY_LEN
            )));
        }
    }
    Ok(())
}

/// Validate batch operation count
pub fn validate_batch_size(count: usize) -> Result<()> {
    if count > MAX_BATCH_OPERATIONS {
        return Err(Error::MergeFailed {
            operation: None,
            reason: format!(
                "too many operations in batch: {} (max {})",
                count, MAX_BATCH_OPERATIONS
            ),
        });
    }
    Ok(())
}
