//! Minimal in-memory document model
//!
//! Parses a simplified HTML/XML-like markup string into a tree, answers
//! document-order queries (id, tag, simple selectors), propagates events in
//! three phases, and keeps an optional per-document index cache.
//!
//! ## Core Design
//!
//! ```text
//! markup ──MarkupParser──▶ DomArena (owned nodes, NodeId = u32)
//!                              │
//!            ┌─────────────────┼──────────────────┬───────────────┐
//!            ▼                 ▼                  ▼               ▼
//!      DomSerializer     Selector engine    EventDispatcher   IndexCache
//! ```
//!
//! `Document` ties one arena to its listeners and cache. Nothing is global.
//!
//! ```
//! use markup_dom::Document;
//!
//! let doc = Document::parse(r#"<div id="a"><p>Hi</p></div>"#);
//! let div = doc.get_element_by_id("a").unwrap();
//! assert_eq!(doc.text_content(div).unwrap(), "Hi");
//! assert_eq!(doc.serialize().unwrap(), r#"<div id="a"><p>Hi</p></div>"#);
//! ```

pub mod arena;
pub mod cache;
pub mod document;
pub mod error;
pub mod event;
pub mod parser;
pub mod selector;
pub mod serializer;
pub mod types;
pub mod utils;

pub use arena::DomArena;
pub use cache::IndexCache;
pub use document::{Document, DocumentConfig};
pub use error::{DomError, Result};
pub use event::{Event, EventDispatcher, EventListener, EventPhase, ListenerRegistry, MouseDetail};
pub use parser::{MarkupParser, ParserConfig};
pub use selector::{Combinator, Selector, SimpleSelector};
pub use serializer::{DomSerializer, SerializerConfig};
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_types_serialize_with_serde() {
        let doc = Document::parse(r#"<a href="/x">go<![CDATA[c]]></a>"#);
        let a = doc.query_selector("a").unwrap();
        let node = doc.node(a).unwrap();

        let json = serde_json::to_value(node).unwrap();
        assert_eq!(json["kind"]["Element"]["tag_name"], "a");
        assert_eq!(json["kind"]["Element"]["attributes"]["href"], "/x");
        assert_eq!(json["children_ids"].as_array().unwrap().len(), 2);

        let back: DomNode = serde_json::from_value(json).unwrap();
        assert_eq!(&back, node);
    }
}
