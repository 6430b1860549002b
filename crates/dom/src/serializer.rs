//! DOM Serializer - Convert a tree back to text
//!
//! Two outputs:
//! - markup (`serialize`): the exact, deterministic text form of a subtree
//! - outlines (`dump_depth_first`, `dump_breadth_first`): indented listings
//!   for humans, shaped by `SerializerConfig`
//!
//! Markup rules: text is emitted raw, CDATA is wrapped in `<![CDATA[..]]>`,
//! childless elements are always self-closing and attributes come out in
//! name order. `<div></div>` therefore comes back as `<div/>`.

use crate::arena::DomArena;
use crate::error::Result;
use crate::types::{NodeId, NodeKind};
use crate::utils::cap_text_length;
use std::fmt::Write;

/// Attributes shown in outline dumps by default
pub const DEFAULT_OUTLINE_ATTRIBUTES: &[&str] = &["id", "class", "href", "src"];

/// Serializer configuration (outline dumps only)
#[derive(Debug, Clone)]
pub struct SerializerConfig {
    pub include_attributes: Vec<String>,
    pub max_text_length: usize,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            include_attributes: DEFAULT_OUTLINE_ATTRIBUTES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_text_length: 50,
        }
    }
}

/// DOM Tree Serializer
#[derive(Debug, Clone, Default)]
pub struct DomSerializer {
    config: SerializerConfig,
}

enum Step {
    Open(NodeId),
    Close(NodeId),
}

impl DomSerializer {
    pub fn new() -> Self {
        Self::with_config(SerializerConfig::default())
    }

    pub fn with_config(config: SerializerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SerializerConfig {
        &self.config
    }

    /// Serialize the subtree rooted at `node_id` to markup
    pub fn serialize(&self, arena: &DomArena, node_id: NodeId) -> Result<String> {
        let mut output = String::with_capacity(256);
        let mut stack = vec![Step::Open(node_id)];

        while let Some(step) = stack.pop() {
            match step {
                Step::Open(id) => {
                    let node = arena.get(id)?;
                    match &node.kind {
                        NodeKind::Text(text) => output.push_str(text),
                        NodeKind::Cdata(data) => {
                            output.push_str("<![CDATA[");
                            output.push_str(data);
                            output.push_str("]]>");
                        }
                        NodeKind::Element(el) => {
                            output.push('<');
                            output.push_str(&el.tag_name);
                            for (name, value) in &el.attributes {
                                let _ = write!(output, " {}=\"{}\"", name, value);
                            }

                            if node.children_ids.is_empty() {
                                output.push_str("/>");
                            } else {
                                output.push('>');
                                stack.push(Step::Close(id));
                                for &child_id in node.children_ids.iter().rev() {
                                    stack.push(Step::Open(child_id));
                                }
                            }
                        }
                    }
                }
                Step::Close(id) => {
                    if let Some(tag) = arena.get(id)?.tag_name() {
                        output.push_str("</");
                        output.push_str(tag);
                        output.push('>');
                    }
                }
            }
        }

        Ok(output)
    }

    /// Serialize only the children of `node_id`, concatenated
    ///
    /// For the synthetic root this is the document as it was written,
    /// without the wrapper element.
    pub fn serialize_children(&self, arena: &DomArena, node_id: NodeId) -> Result<String> {
        let mut output = String::new();
        for &child_id in &arena.get(node_id)?.children_ids {
            output.push_str(&self.serialize(arena, child_id)?);
        }
        Ok(output)
    }

    /// Indented pre-order outline of a subtree
    pub fn dump_depth_first(&self, arena: &DomArena, node_id: NodeId) -> Result<String> {
        let mut output = String::new();
        let mut stack = vec![(node_id, 0usize)];

        while let Some((id, depth)) = stack.pop() {
            let node = arena.get(id)?;
            self.outline_node(&node.kind, depth, &mut output);
            for &child_id in node.children_ids.iter().rev() {
                stack.push((child_id, depth + 1));
            }
        }

        Ok(output)
    }

    /// Indented level-order outline; nodes deeper than `max_depth` are left out
    pub fn dump_breadth_first(
        &self,
        arena: &DomArena,
        node_id: NodeId,
        max_depth: Option<usize>,
    ) -> Result<String> {
        let mut output = String::new();
        arena.traverse_bf(node_id, |node, depth| {
            if max_depth.map_or(true, |max| depth <= max) {
                self.outline_node(&node.kind, depth, &mut output);
            }
            Ok(())
        })?;
        Ok(output)
    }

    fn outline_node(&self, kind: &NodeKind, depth: usize, output: &mut String) {
        let indent = "  ".repeat(depth);

        match kind {
            NodeKind::Element(el) => {
                let _ = writeln!(output, "{}Element: {}", indent, el.tag_name);
                for attr_name in &self.config.include_attributes {
                    if let Some(value) = el.attr(attr_name) {
                        let _ = writeln!(
                            output,
                            "{}  Attribute: {}=\"{}\"",
                            indent, attr_name, value
                        );
                    }
                }
            }
            NodeKind::Text(text) => {
                let _ = writeln!(
                    output,
                    "{}Text: {}",
                    indent,
                    cap_text_length(text, self.config.max_text_length)
                );
            }
            NodeKind::Cdata(data) => {
                let _ = writeln!(output, "{}CDATA: <![CDATA[{}]]>", indent, data);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::MarkupParser;

    fn roundtrip(input: &str) -> String {
        let arena = MarkupParser::new().parse(input);
        DomSerializer::new()
            .serialize_children(&arena, arena.root_id())
            .unwrap()
    }

    #[test]
    fn test_serialize_simple_dom() {
        assert_eq!(
            roundtrip(r#"<div id="a"><p>Hi</p></div>"#),
            r#"<div id="a"><p>Hi</p></div>"#
        );
    }

    #[test]
    fn test_empty_elements_self_close() {
        assert_eq!(roundtrip("<br></br>"), "<br/>");
        assert_eq!(roundtrip("<br/>"), "<br/>");
        assert_eq!(roundtrip("<div></div><span />"), "<div/><span/>");
    }

    #[test]
    fn test_attributes_sorted_by_name() {
        assert_eq!(
            roundtrip(r#"<a title="t" href="/x" class="c">go</a>"#),
            r#"<a class="c" href="/x" title="t">go</a>"#
        );
    }

    #[test]
    fn test_cdata_and_raw_text() {
        assert_eq!(
            roundtrip("<s><![CDATA[a<b]]> 1 &amp; 2</s>"),
            "<s><![CDATA[a<b]]> 1 &amp; 2</s>"
        );
    }

    #[test]
    fn test_root_wrapper_serialization() {
        let arena = MarkupParser::new().parse("<a/>text");
        let out = DomSerializer::new().serialize(&arena, arena.root_id()).unwrap();
        assert_eq!(out, "<root><a/>text</root>");
    }

    #[test]
    fn test_serialization_fixpoint() {
        let inputs = [
            "<!DOCTYPE html>\n<html>\n<head><title>T</title></head>\n<body>\n  <p class=\"x y\">one<!-- c --> two</p>\n  <img src=\"a.png\">\n</body>",
            "<a><b></a>c</b>",
            "x<y z=\"1\" broken w=\"2\">",
            "<p>a<![CDATA[ raw ]]>b</p>",
        ];
        for input in inputs {
            let first = MarkupParser::new().parse(input);
            let text = DomSerializer::new()
                .serialize_children(&first, first.root_id())
                .unwrap();
            let second = MarkupParser::new().parse(&text);
            let again = DomSerializer::new()
                .serialize_children(&second, second.root_id())
                .unwrap();

            let a: Vec<_> = first.iter().map(|n| &n.kind).collect();
            let b: Vec<_> = second.iter().map(|n| &n.kind).collect();
            assert_eq!(a, b, "input {input:?}");
            assert_eq!(text, again);
        }
    }

    #[test]
    fn test_dump_depth_first() {
        let arena =
            MarkupParser::new().parse(r#"<div id="m" data-x="no"><p>Hello</p><![CDATA[z]]></div>"#);
        let out = DomSerializer::new()
            .dump_depth_first(&arena, arena.root_id())
            .unwrap();
        let expected = "\
Element: root
  Element: div
    Attribute: id=\"m\"
    Element: p
      Text: Hello
    CDATA: <![CDATA[z]]>
";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_dump_breadth_first_with_limit() {
        let arena = MarkupParser::new().parse("<a><b><c/></b></a><d/>");
        let out = DomSerializer::new()
            .dump_breadth_first(&arena, arena.root_id(), Some(2))
            .unwrap();
        let expected = "\
Element: root
  Element: a
  Element: d
    Element: b
";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_dump_truncates_long_text() {
        let long = "x".repeat(80);
        let arena = MarkupParser::new().parse(&format!("<p>{long}</p>"));
        let out = DomSerializer::new()
            .dump_depth_first(&arena, arena.root_id())
            .unwrap();
        assert!(out.contains(&format!("Text: {}...", "x".repeat(47))));
    }
}
