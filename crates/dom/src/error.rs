//! Error types for DOM operations
//!
//! Simple, flat error hierarchy. Malformed markup is not an error: the parser
//! degrades silently. Lookups that find nothing return `None` or an empty
//! `Vec`. What is left are misuses of node ids.

use thiserror::Error;

use crate::types::NodeId;

pub type Result<T> = std::result::Result<T, DomError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Invalid node type: expected {expected}, got {actual}")]
    InvalidNodeType { expected: String, actual: String },

    #[error("Hierarchy request error: {0}")]
    HierarchyRequest(String),
}

impl DomError {
    pub(crate) fn not_an_element(actual: &str) -> Self {
        DomError::InvalidNodeType {
            expected: "element".to_string(),
            actual: actual.to_string(),
        }
    }
}
