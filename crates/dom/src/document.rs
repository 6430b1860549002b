//! Document - main entry point for DOM operations
//!
//! A `Document` is one tree plus everything scoped to it:
//! - the arena holding the nodes (with its synthetic `root` element)
//! - the listener registry for event dispatch
//! - the index cache for fast lookups
//!
//! Nothing is global. Two documents in one process never share listeners
//! or cache entries. Every document gets a uuid that shows up in its log
//! lines.

use crate::arena::DomArena;
use crate::cache::IndexCache;
use crate::error::Result;
use crate::event::{Event, EventDispatcher, EventListener, ListenerRegistry};
use crate::parser::{MarkupParser, ParserConfig};
use crate::selector::Selector;
use crate::serializer::{DomSerializer, SerializerConfig};
use crate::types::{DomNode, NodeId};
use uuid::Uuid;

/// Configuration for a document
#[derive(Debug, Clone, Default)]
pub struct DocumentConfig {
    pub parser: ParserConfig,
    pub serializer: SerializerConfig,
}

/// A parsed (or hand-built) document and its per-tree state
#[derive(Debug)]
pub struct Document {
    id: Uuid,
    config: DocumentConfig,
    arena: DomArena,
    listeners: ListenerRegistry,
    cache: IndexCache,
}

impl Document {
    /// Create an empty document (just the root) with default config
    pub fn new() -> Self {
        Self::with_config(DocumentConfig::default())
    }

    /// Create an empty document with custom config
    pub fn with_config(config: DocumentConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            arena: DomArena::new(),
            listeners: ListenerRegistry::new(),
            cache: IndexCache::new(),
        }
    }

    /// Parse markup into a new document
    pub fn parse(input: &str) -> Self {
        Self::parse_with_config(input, DocumentConfig::default())
    }

    pub fn parse_with_config(input: &str, config: DocumentConfig) -> Self {
        let mut doc = Self::with_config(config);
        let span = tracing::debug_span!("parse", document = %doc.id);
        let _guard = span.enter();
        doc.arena = MarkupParser::with_config(doc.config.parser.clone()).parse(input);
        doc
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    /// Get reference to internal arena
    pub fn arena(&self) -> &DomArena {
        &self.arena
    }

    /// Get mutable reference to internal arena
    ///
    /// Removing nodes through this bypasses listener cleanup; prefer
    /// `remove_child`.
    pub fn arena_mut(&mut self) -> &mut DomArena {
        &mut self.arena
    }

    /// The synthetic root element
    pub fn root(&self) -> NodeId {
        self.arena.root_id()
    }

    pub fn node(&self, node_id: NodeId) -> Result<&DomNode> {
        self.arena.get(node_id)
    }

    // ---- serialization -------------------------------------------------

    /// Markup of the whole document, without the synthetic root wrapper
    pub fn serialize(&self) -> Result<String> {
        self.serializer().serialize_children(&self.arena, self.root())
    }

    /// Markup of one subtree, the node itself included
    pub fn serialize_node(&self, node_id: NodeId) -> Result<String> {
        self.serializer().serialize(&self.arena, node_id)
    }

    pub fn dump_depth_first(&self, node_id: NodeId) -> Result<String> {
        self.serializer().dump_depth_first(&self.arena, node_id)
    }

    pub fn dump_breadth_first(&self, node_id: NodeId, max_depth: Option<usize>) -> Result<String> {
        self.serializer()
            .dump_breadth_first(&self.arena, node_id, max_depth)
    }

    fn serializer(&self) -> DomSerializer {
        DomSerializer::with_config(self.config.serializer.clone())
    }

    // ---- tree construction ---------------------------------------------

    pub fn create_element(&mut self, tag_name: impl Into<String>) -> NodeId {
        self.arena.create_element(tag_name)
    }

    pub fn create_text(&mut self, content: impl Into<String>) -> NodeId {
        self.arena.create_text(content)
    }

    pub fn create_cdata(&mut self, content: impl Into<String>) -> NodeId {
        self.arena.create_cdata(content)
    }

    pub fn append_child(&mut self, parent_id: NodeId, child_id: NodeId) -> Result<()> {
        self.arena.append_child(parent_id, child_id)
    }

    /// Remove and destroy a subtree, dropping listeners registered inside it
    pub fn remove_child(&mut self, parent_id: NodeId, child_id: NodeId) -> Result<()> {
        for id in self.arena.remove_child(parent_id, child_id)? {
            self.listeners.remove_node(id);
        }
        Ok(())
    }

    /// Detached deep copy of a subtree; listeners are not copied
    pub fn clone_node(&mut self, node_id: NodeId) -> Result<NodeId> {
        self.arena.deep_clone(node_id)
    }

    /// Destroy a detached subtree (unused clone or never-appended node),
    /// dropping listeners registered inside it
    pub fn destroy_node(&mut self, node_id: NodeId) -> Result<()> {
        for id in self.arena.destroy(node_id)? {
            self.listeners.remove_node(id);
        }
        Ok(())
    }

    pub fn set_attribute(
        &mut self,
        node_id: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<()> {
        self.arena.set_attribute(node_id, name, value)
    }

    pub fn get_attribute(&self, node_id: NodeId, name: &str) -> Option<&str> {
        self.arena.get_attribute(node_id, name)
    }

    pub fn remove_attribute(&mut self, node_id: NodeId, name: &str) -> Result<Option<String>> {
        self.arena.remove_attribute(node_id, name)
    }

    pub fn set_text(&mut self, node_id: NodeId, content: impl Into<String>) -> Result<()> {
        self.arena.set_text(node_id, content)
    }

    pub fn text_content(&self, node_id: NodeId) -> Result<String> {
        self.arena.text_content(node_id)
    }

    // ---- tree-walk queries ---------------------------------------------

    /// First element in document order with this `id`
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.arena.find_by_id(self.root(), id)
    }

    pub fn get_elements_by_tag_name(&self, tag: &str) -> Vec<NodeId> {
        self.arena.find_by_tag(self.root(), tag)
    }

    pub fn query_selector_all(&self, selector: &str) -> Vec<NodeId> {
        Selector::parse(selector).query_all(&self.arena, self.root())
    }

    pub fn query_selector(&self, selector: &str) -> Option<NodeId> {
        Selector::parse(selector).query_first(&self.arena, self.root())
    }

    // ---- index cache ---------------------------------------------------

    /// Snapshot id/tag/class indices of the current tree
    pub fn build_cache(&mut self) -> Result<()> {
        let span = tracing::debug_span!("build_cache", document = %self.id);
        let _guard = span.enter();
        self.cache.build(&self.arena, self.arena.root_id())
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn is_cache_built(&self) -> bool {
        self.cache.is_built()
    }

    pub fn get_element_by_id_fast(&self, id: &str) -> Option<NodeId> {
        let _guard = tracing::warn_span!("cache", document = %self.id).entered();
        self.cache.element_by_id(id)
    }

    pub fn get_elements_by_tag_name_fast(&self, tag: &str) -> Vec<NodeId> {
        let _guard = tracing::warn_span!("cache", document = %self.id).entered();
        self.cache.elements_by_tag_name(tag)
    }

    pub fn get_elements_by_class_name_fast(&self, class: &str) -> Vec<NodeId> {
        let _guard = tracing::warn_span!("cache", document = %self.id).entered();
        self.cache.elements_by_class_name(class)
    }

    // ---- events --------------------------------------------------------

    /// Register a listener on an element; listeners of one type run in
    /// registration order
    pub fn add_event_listener<F>(
        &mut self,
        node_id: NodeId,
        event_type: impl Into<String>,
        listener: F,
    ) -> Result<()>
    where
        F: FnMut(&mut Event) + 'static,
    {
        self.arena.element(node_id)?;
        let listener: EventListener = Box::new(listener);
        self.listeners.add(node_id, event_type, listener);
        Ok(())
    }

    /// Drop every listener of `event_type` on `node_id`
    pub fn remove_event_listeners(&mut self, node_id: NodeId, event_type: &str) {
        self.listeners.clear(node_id, event_type);
    }

    pub fn listener_count(&self, node_id: NodeId, event_type: &str) -> usize {
        self.listeners.count(node_id, event_type)
    }

    /// Dispatch an event at `node_id`
    ///
    /// Returns `Ok(false)` if a listener prevented the default action. The
    /// event's propagation flags are left as the listeners set them; call
    /// `Event::reset_flags` before dispatching the same event again.
    pub fn dispatch_event(&mut self, node_id: NodeId, event: &mut Event) -> Result<bool> {
        let _guard = tracing::debug_span!("dispatch", document = %self.id).entered();
        EventDispatcher::dispatch(&self.arena, &mut self.listeners, node_id, event)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
