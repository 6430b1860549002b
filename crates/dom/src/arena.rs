//! Arena-based document tree storage
//!
//! Every node lives in one `Vec`, addressed by a 4-byte `NodeId`. Children
//! are owned through the parent's `children_ids`; `parent_id` is only a
//! back-reference for walking upward. Removing a child destroys its whole
//! subtree: the slots are tombstoned and their ids stop resolving.
//!
//! ```text
//! Arena: Vec<Option<DomNode>>
//!        [root][Node1][ -- ][Node3]...
//!          ↑ slot 0 is always the synthetic root element
//! ```
//!
//! Nothing here recurses. Traversal, cloning and destruction all use an
//! explicit stack, so nesting depth is bounded by memory, not by the call
//! stack.

use crate::error::{DomError, Result};
use crate::types::{DomNode, ElementData, NodeId, NodeKind, ROOT_TAG};
use std::collections::VecDeque;

/// Arena allocator for document nodes
#[derive(Debug, Clone)]
pub struct DomArena {
    /// Node slots; `None` marks a destroyed node
    nodes: Vec<Option<DomNode>>,

    /// Number of live slots
    live: usize,
}

impl DomArena {
    /// Create an arena holding only the synthetic root element
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    /// Create arena with specific capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let mut arena = Self {
            nodes: Vec::with_capacity(capacity.max(1)),
            live: 0,
        };
        arena.add_node(NodeKind::Element(ElementData::new(ROOT_TAG)));
        arena
    }

    /// Add a detached node to the arena, returns its ID
    pub fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let node_id = self.nodes.len() as NodeId;
        self.nodes.push(Some(DomNode::new(node_id, kind)));
        self.live += 1;
        node_id
    }

    pub fn create_element(&mut self, tag_name: impl Into<String>) -> NodeId {
        self.add_node(NodeKind::Element(ElementData::new(tag_name)))
    }

    pub fn create_text(&mut self, content: impl Into<String>) -> NodeId {
        self.add_node(NodeKind::Text(content.into()))
    }

    pub fn create_cdata(&mut self, content: impl Into<String>) -> NodeId {
        self.add_node(NodeKind::Cdata(content.into()))
    }

    /// Get node by ID (immutable)
    pub fn get(&self, node_id: NodeId) -> Result<&DomNode> {
        self.nodes
            .get(node_id as usize)
            .and_then(Option::as_ref)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Get node by ID (mutable)
    pub fn get_mut(&mut self, node_id: NodeId) -> Result<&mut DomNode> {
        self.nodes
            .get_mut(node_id as usize)
            .and_then(Option::as_mut)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Get element payload, failing for text and CDATA nodes
    pub fn element(&self, node_id: NodeId) -> Result<&ElementData> {
        let node = self.get(node_id)?;
        node.as_element()
            .ok_or_else(|| DomError::not_an_element(node.kind.name()))
    }

    pub fn element_mut(&mut self, node_id: NodeId) -> Result<&mut ElementData> {
        let node = self.get_mut(node_id)?;
        let actual = node.kind.name();
        node.as_element_mut()
            .ok_or_else(|| DomError::not_an_element(actual))
    }

    /// Whether `node_id` refers to a live node
    pub fn contains(&self, node_id: NodeId) -> bool {
        self.get(node_id).is_ok()
    }

    /// Root node ID (always slot 0)
    pub fn root_id(&self) -> NodeId {
        0
    }

    /// Get root node
    pub fn root(&self) -> &DomNode {
        match self.nodes.first() {
            Some(Some(root)) => root,
            _ => unreachable!("arena root slot is never destroyed"),
        }
    }

    /// Number of live nodes, root included
    pub fn len(&self) -> usize {
        self.live
    }

    /// True when only the root is left
    pub fn is_empty(&self) -> bool {
        self.live <= 1
    }

    /// Iterator over all live nodes in allocation order
    pub fn iter(&self) -> impl Iterator<Item = &DomNode> {
        self.nodes.iter().filter_map(Option::as_ref)
    }

    /// Get children of a node
    pub fn children(&self, node_id: NodeId) -> Result<Vec<&DomNode>> {
        let node = self.get(node_id)?;
        node.children_ids
            .iter()
            .map(|&child_id| self.get(child_id))
            .collect()
    }

    /// Get parent of a node
    pub fn parent(&self, node_id: NodeId) -> Result<Option<&DomNode>> {
        let node = self.get(node_id)?;
        match node.parent_id {
            Some(parent_id) => Ok(Some(self.get(parent_id)?)),
            None => Ok(None),
        }
    }

    /// Ancestor IDs, nearest first
    pub fn ancestors(&self, node_id: NodeId) -> Result<Vec<NodeId>> {
        let mut out = Vec::new();
        let mut current = self.get(node_id)?.parent_id;
        while let Some(id) = current {
            out.push(id);
            current = self.get(id)?.parent_id;
        }
        Ok(out)
    }

    /// Append `child` as the last child of `parent`
    ///
    /// A child that already has a parent is moved. The parent must be an
    /// element, the root cannot be moved, and a node cannot be appended
    /// under itself or one of its descendants.
    pub fn append_child(&mut self, parent_id: NodeId, child_id: NodeId) -> Result<()> {
        self.element(parent_id)?;
        self.get(child_id)?;

        if child_id == self.root_id() {
            return Err(DomError::HierarchyRequest(
                "the root element cannot be moved".to_string(),
            ));
        }
        if child_id == parent_id || self.ancestors(parent_id)?.contains(&child_id) {
            return Err(DomError::HierarchyRequest(format!(
                "node {} is an ancestor of node {}",
                child_id, parent_id
            )));
        }

        self.detach(child_id)?;
        self.get_mut(parent_id)?.children_ids.push(child_id);
        self.get_mut(child_id)?.parent_id = Some(parent_id);
        Ok(())
    }

    /// Remove `child` from `parent` and destroy its subtree
    ///
    /// Returns the destroyed IDs in document order, so callers holding
    /// per-node state (listeners) can drop it.
    pub fn remove_child(&mut self, parent_id: NodeId, child_id: NodeId) -> Result<Vec<NodeId>> {
        if self.get(child_id)?.parent_id != Some(parent_id) {
            return Err(DomError::HierarchyRequest(format!(
                "node {} is not a child of node {}",
                child_id, parent_id
            )));
        }

        self.detach(child_id)?;
        self.tombstone_subtree(child_id)
    }

    /// Destroy a detached subtree, such as an unused `deep_clone` copy or a
    /// created node that was never appended
    ///
    /// Attached nodes (and the root) are refused; use `remove_child` for
    /// those. Returns the destroyed IDs in document order.
    pub fn destroy(&mut self, node_id: NodeId) -> Result<Vec<NodeId>> {
        if node_id == self.root_id() {
            return Err(DomError::HierarchyRequest(
                "the root node cannot be destroyed".to_string(),
            ));
        }
        if let Some(parent_id) = self.get(node_id)?.parent_id {
            return Err(DomError::HierarchyRequest(format!(
                "node {} is still attached to node {}",
                node_id, parent_id
            )));
        }
        self.tombstone_subtree(node_id)
    }

    fn tombstone_subtree(&mut self, node_id: NodeId) -> Result<Vec<NodeId>> {
        let doomed = self.descendants(node_id)?;
        for &id in &doomed {
            if let Some(slot) = self.nodes.get_mut(id as usize) {
                if slot.take().is_some() {
                    self.live -= 1;
                }
            }
        }
        Ok(doomed)
    }

    /// Unlink a node from its parent's child list, keeping its subtree
    fn detach(&mut self, node_id: NodeId) -> Result<()> {
        if let Some(parent_id) = self.get(node_id)?.parent_id {
            self.get_mut(parent_id)?
                .children_ids
                .retain(|id| *id != node_id);
            self.get_mut(node_id)?.parent_id = None;
        }
        Ok(())
    }

    /// Deep-copy a subtree, returning the detached copy's ID
    pub fn deep_clone(&mut self, node_id: NodeId) -> Result<NodeId> {
        let kind = self.get(node_id)?.kind.clone();
        let copy_root = self.add_node(kind);

        // (source, copy) pairs whose children still need copying
        let mut stack = vec![(node_id, copy_root)];
        while let Some((src, dst)) = stack.pop() {
            let child_ids = self.get(src)?.children_ids.clone();
            for child in child_ids {
                let kind = self.get(child)?.kind.clone();
                let copy = self.add_node(kind);
                self.get_mut(copy)?.parent_id = Some(dst);
                self.get_mut(dst)?.children_ids.push(copy);
                stack.push((child, copy));
            }
        }

        Ok(copy_root)
    }

    /// Set an attribute on an element
    pub fn set_attribute(
        &mut self,
        node_id: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<()> {
        self.element_mut(node_id)?.set_attr(name, value);
        Ok(())
    }

    /// Get attribute value; `None` for missing attributes and non-elements
    pub fn get_attribute(&self, node_id: NodeId, name: &str) -> Option<&str> {
        self.get(node_id).ok().and_then(|node| node.attr(name))
    }

    /// Remove an attribute, returning its old value
    pub fn remove_attribute(&mut self, node_id: NodeId, name: &str) -> Result<Option<String>> {
        Ok(self.element_mut(node_id)?.attributes.remove(name))
    }

    /// Replace the content of a text node
    pub fn set_text(&mut self, node_id: NodeId, content: impl Into<String>) -> Result<()> {
        let node = self.get_mut(node_id)?;
        match &mut node.kind {
            NodeKind::Text(text) => {
                *text = content.into();
                Ok(())
            }
            other => Err(DomError::InvalidNodeType {
                expected: "text".to_string(),
                actual: other.name().to_string(),
            }),
        }
    }

    /// Traverse tree depth-first (iterative, no recursion)
    ///
    /// Visits in document order: a node, then its children left to right.
    pub fn traverse_df<F>(&self, start_id: NodeId, mut visit: F) -> Result<()>
    where
        F: FnMut(&DomNode) -> Result<()>,
    {
        let mut stack = vec![start_id];

        while let Some(node_id) = stack.pop() {
            let node = self.get(node_id)?;
            visit(node)?;

            // Push children in reverse order (so they're visited left-to-right)
            for &child_id in node.children_ids.iter().rev() {
                stack.push(child_id);
            }
        }

        Ok(())
    }

    /// Traverse tree breadth-first, passing each node's depth below `start_id`
    pub fn traverse_bf<F>(&self, start_id: NodeId, mut visit: F) -> Result<()>
    where
        F: FnMut(&DomNode, usize) -> Result<()>,
    {
        let mut queue = VecDeque::new();
        queue.push_back((start_id, 0));

        while let Some((node_id, depth)) = queue.pop_front() {
            let node = self.get(node_id)?;
            visit(node, depth)?;

            for &child_id in node.children_ids.iter() {
                queue.push_back((child_id, depth + 1));
            }
        }

        Ok(())
    }

    /// All IDs in the subtree rooted at `start_id`, in document order
    pub fn descendants(&self, start_id: NodeId) -> Result<Vec<NodeId>> {
        let mut out = Vec::new();
        self.traverse_df(start_id, |node| {
            out.push(node.node_id);
            Ok(())
        })?;
        Ok(out)
    }

    /// Find nodes under `start_id` matching predicate, in document order
    pub fn find<F>(&self, start_id: NodeId, predicate: F) -> Vec<NodeId>
    where
        F: Fn(&DomNode) -> bool,
    {
        let mut out = Vec::new();
        let _ = self.traverse_df(start_id, |node| {
            if predicate(node) {
                out.push(node.node_id);
            }
            Ok(())
        });
        out
    }

    /// Find first node under `start_id` matching predicate
    pub fn find_one<F>(&self, start_id: NodeId, predicate: F) -> Option<NodeId>
    where
        F: Fn(&DomNode) -> bool,
    {
        let mut stack = vec![start_id];
        while let Some(node_id) = stack.pop() {
            let node = self.get(node_id).ok()?;
            if predicate(node) {
                return Some(node_id);
            }
            stack.extend(node.children_ids.iter().rev().copied());
        }
        None
    }

    /// Find all elements by tag name (exact, case-sensitive)
    pub fn find_by_tag(&self, start_id: NodeId, tag: &str) -> Vec<NodeId> {
        self.find(start_id, |node| node.tag_name() == Some(tag))
    }

    /// Find the first element whose `id` attribute equals `id`
    ///
    /// An empty `id` never matches, so `id=""` is not an identifier.
    pub fn find_by_id(&self, start_id: NodeId, id: &str) -> Option<NodeId> {
        if id.is_empty() {
            return None;
        }
        self.find_one(start_id, |node| node.attr("id") == Some(id))
    }

    /// Concatenated text of every text node in the subtree, trimmed
    pub fn text_content(&self, node_id: NodeId) -> Result<String> {
        let mut text = String::new();

        self.traverse_df(node_id, |node| {
            if let NodeKind::Text(content) = &node.kind {
                text.push_str(content);
            }
            Ok(())
        })?;

        Ok(text.trim().to_string())
    }

    /// Drop every node except a fresh root (reuses the allocation)
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.live = 0;
        self.add_node(NodeKind::Element(ElementData::new(ROOT_TAG)));
    }
}

impl Default for DomArena {
    fn default() -> Self {
        Self::new()
    }
}
