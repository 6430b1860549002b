//! Index cache - id / tag / class lookups without walking the tree
//!
//! `build` takes one snapshot of a subtree. Nothing invalidates it: after any
//! insert, removal or attribute change the indices are stale until the next
//! `build`. Querying before the first build logs a warning and returns
//! nothing rather than building implicitly.

use crate::arena::DomArena;
use crate::error::Result;
use crate::types::{NodeId, NodeKind};
use crate::utils::distinct_tokens;
use ahash::AHashMap;

#[derive(Debug, Default, Clone)]
pub struct IndexCache {
    by_id: AHashMap<String, NodeId>,
    by_tag: AHashMap<String, Vec<NodeId>>,
    by_class: AHashMap<String, Vec<NodeId>>,
    built: bool,
}

impl IndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild all three indices from the subtree at `start_id`
    ///
    /// Duplicate ids: the last element in document order wins.
    pub fn build(&mut self, arena: &DomArena, start_id: NodeId) -> Result<()> {
        self.by_id.clear();
        self.by_tag.clear();
        self.by_class.clear();
        self.built = false;

        let by_id = &mut self.by_id;
        let by_tag = &mut self.by_tag;
        let by_class = &mut self.by_class;

        arena.traverse_df(start_id, |node| {
            let NodeKind::Element(el) = &node.kind else {
                return Ok(());
            };

            by_tag
                .entry(el.tag_name.clone())
                .or_default()
                .push(node.node_id);

            if let Some(id) = el.attr("id").filter(|id| !id.is_empty()) {
                by_id.insert(id.to_string(), node.node_id);
            }

            if let Some(class) = el.attr("class") {
                for token in distinct_tokens(class) {
                    by_class
                        .entry(token.to_string())
                        .or_default()
                        .push(node.node_id);
                }
            }
            Ok(())
        })?;

        self.built = true;
        tracing::debug!(
            ids = self.by_id.len(),
            tags = self.by_tag.len(),
            classes = self.by_class.len(),
            "index cache built"
        );
        Ok(())
    }

    /// Forget everything; lookups warn again until the next build
    pub fn clear(&mut self) {
        self.by_id.clear();
        self.by_tag.clear();
        self.by_class.clear();
        self.built = false;
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        if !self.check_built("element_by_id") {
            return None;
        }
        self.by_id.get(id).copied()
    }

    pub fn elements_by_tag_name(&self, tag: &str) -> Vec<NodeId> {
        if !self.check_built("elements_by_tag_name") {
            return Vec::new();
        }
        self.by_tag.get(tag).cloned().unwrap_or_default()
    }

    /// Elements carrying `class` as a whole whitespace-separated token
    pub fn elements_by_class_name(&self, class: &str) -> Vec<NodeId> {
        if !self.check_built("elements_by_class_name") {
            return Vec::new();
        }
        self.by_class.get(class).cloned().unwrap_or_default()
    }

    fn check_built(&self, lookup: &str) -> bool {
        if !self.built {
            tracing::warn!(lookup, "index cache queried before build, returning nothing");
        }
        self.built
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::MarkupParser;

    const PAGE: &str = r#"<ul id="list"><li class="item first item">1</li><li class="item">2</li><li id="list" class="last">3</li></ul>"#;

    fn built() -> (DomArena, IndexCache) {
        let arena = MarkupParser::new().parse(PAGE);
        let mut cache = IndexCache::new();
        cache.build(&arena, arena.root_id()).unwrap();
        (arena, cache)
    }

    #[test]
    fn test_lookups_before_build_are_empty() {
        let cache = IndexCache::new();
        assert!(!cache.is_built());
        assert_eq!(cache.element_by_id("list"), None);
        assert!(cache.elements_by_tag_name("li").is_empty());
        assert!(cache.elements_by_class_name("item").is_empty());
    }

    #[test]
    fn test_tag_index_in_document_order() {
        let (arena, cache) = built();
        let lis = cache.elements_by_tag_name("li");
        assert_eq!(lis, arena.find_by_tag(arena.root_id(), "li"));
        assert_eq!(lis.len(), 3);
        assert_eq!(cache.elements_by_tag_name("root"), vec![arena.root_id()]);
        assert!(cache.elements_by_tag_name("table").is_empty());
    }

    #[test]
    fn test_duplicate_id_last_wins() {
        let (arena, cache) = built();
        let last_li = *cache.elements_by_tag_name("li").last().unwrap();
        assert_eq!(cache.element_by_id("list"), Some(last_li));
        // A tree walk stops at the first one instead
        assert_ne!(arena.find_by_id(arena.root_id(), "list"), Some(last_li));
    }

    #[test]
    fn test_empty_id_is_not_indexed() {
        let arena = MarkupParser::new().parse(r#"<p id="">a</p><p id="x">b</p>"#);
        let mut cache = IndexCache::new();
        cache.build(&arena, arena.root_id()).unwrap();

        assert_eq!(cache.element_by_id(""), None);
        assert_eq!(arena.find_by_id(arena.root_id(), ""), None);
        assert!(cache.element_by_id("x").is_some());
    }

    #[test]
    fn test_class_index_splits_tokens() {
        let (_, cache) = built();
        let items = cache.elements_by_class_name("item");
        // "item first item" contributes once
        assert_eq!(items.len(), 2);
        assert_eq!(cache.elements_by_class_name("first").len(), 1);
        assert_eq!(cache.elements_by_class_name("last").len(), 1);
        // Whole tokens only, unlike the `.class` selector
        assert!(cache.elements_by_class_name("ite").is_empty());
    }

    #[test]
    fn test_cache_goes_stale_without_rebuild() {
        let (mut arena, mut cache) = built();
        let extra = arena.create_element("li");
        arena.append_child(arena.root_id(), extra).unwrap();

        assert_eq!(cache.elements_by_tag_name("li").len(), 3);

        cache.build(&arena, arena.root_id()).unwrap();
        assert_eq!(cache.elements_by_tag_name("li").len(), 4);
    }

    #[test]
    fn test_clear_resets_built_flag() {
        let (_, mut cache) = built();
        cache.clear();
        assert!(!cache.is_built());
        assert!(cache.elements_by_tag_name("li").is_empty());
    }
}
