//! Core type definitions for the document tree
//!
//! Key design principles:
//! 1. Use u32 for indices (4 bytes vs 8 bytes pointer)
//! 2. Closed set of node variants, matched exhaustively
//! 3. Use SmallVec for child lists (most elements have few children)
//! 4. Attributes in a BTreeMap so iteration order is lexicographic

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Node identifier (index into arena)
pub type NodeId = u32;

/// Tag name of the synthetic element that wraps every parsed document
pub const ROOT_TAG: &str = "root";

/// Element payload: tag name plus attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementData {
    pub tag_name: String,
    pub attributes: BTreeMap<String, String>,
}

impl ElementData {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Get attribute value
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    /// Insert or overwrite an attribute
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Whitespace-separated tokens of the `class` attribute
    pub fn class_tokens(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }
}

/// What a node is. No catch-all variant: every match is exhaustive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Text(String),
    Cdata(String),
    Element(ElementData),
}

impl NodeKind {
    /// Short name used in error messages and log fields
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Text(_) => "text",
            NodeKind::Cdata(_) => "cdata",
            NodeKind::Element(_) => "element",
        }
    }
}

/// A node in the arena
///
/// `parent` is a back-reference for walking upward only; a node's lifetime
/// is decided by whichever node lists it in `children`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomNode {
    pub node_id: NodeId,
    pub parent_id: Option<NodeId>,
    pub children_ids: SmallVec<[NodeId; 4]>,
    pub kind: NodeKind,
}

impl DomNode {
    pub fn new(node_id: NodeId, kind: NodeKind) -> Self {
        Self {
            node_id,
            parent_id: None,
            children_ids: SmallVec::new(),
            kind,
        }
    }

    /// Get tag name for element nodes
    pub fn tag_name(&self) -> Option<&str> {
        self.as_element().map(|el| el.tag_name.as_str())
    }

    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.kind {
            NodeKind::Element(el) => Some(el),
            NodeKind::Text(_) | NodeKind::Cdata(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.kind {
            NodeKind::Element(el) => Some(el),
            NodeKind::Text(_) | NodeKind::Cdata(_) => None,
        }
    }

    /// Check if node is an element
    pub fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element(_))
    }

    /// Check if node is text
    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text(_))
    }

    /// Get attribute value (always `None` for non-elements)
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.as_element().and_then(|el| el.attr(name))
    }
}
