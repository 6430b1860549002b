//! Selector engine - a deliberately partial CSS subset
//!
//! A selector string is split on whitespace into simple selectors, and
//! every one of them is tested against the *same* element. Whitespace is not
//! a descendant combinator here: `div .note` means "a div whose class
//! contains `note`", not "a `.note` inside a div".
//!
//! | token          | matches when                                     |
//! |----------------|--------------------------------------------------|
//! | `div`          | tag name equals `div`                            |
//! | `#main`        | `id` attribute equals `main`                     |
//! | `.note`        | `class` attribute contains `note` as a substring |
//! | `[href]`       | attribute `href` exists                          |
//! | `[type=text]`  | attribute `type` equals `text` (quotes optional) |
//! | `>` `+` `~`    | never (combinators are recognised, not evaluated)|
//!
//! The class test is a substring test, so `.ab` matches `class="table"`.

use crate::arena::DomArena;
use crate::types::{DomNode, ElementData, NodeId};
use crate::utils::strip_quotes;
use std::fmt;

/// Relationship between compound selectors. Parsed, never evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    /// `a b`
    Descendant,
    /// `a > b`
    Child,
    /// `a + b`
    Adjacent,
    /// `a ~ b`
    Sibling,
}

impl Combinator {
    pub fn symbol(self) -> &'static str {
        match self {
            Combinator::Descendant => " ",
            Combinator::Child => ">",
            Combinator::Adjacent => "+",
            Combinator::Sibling => "~",
        }
    }
}

/// One whitespace-separated token of a selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    Tag(String),
    Id(String),
    Class(String),
    HasAttribute(String),
    AttributeEquals { name: String, value: String },
    Combinator(Combinator),
}

impl SimpleSelector {
    fn parse(token: &str) -> Self {
        match token {
            ">" => return SimpleSelector::Combinator(Combinator::Child),
            "+" => return SimpleSelector::Combinator(Combinator::Adjacent),
            "~" => return SimpleSelector::Combinator(Combinator::Sibling),
            _ => {}
        }

        if let Some(id) = token.strip_prefix('#') {
            SimpleSelector::Id(id.to_string())
        } else if let Some(class) = token.strip_prefix('.') {
            SimpleSelector::Class(class.to_string())
        } else if let Some(body) = token.strip_prefix('[') {
            let body = body.strip_suffix(']').unwrap_or(body);
            match body.split_once('=') {
                Some((name, value)) => SimpleSelector::AttributeEquals {
                    name: name.to_string(),
                    value: strip_quotes(value).to_string(),
                },
                None => SimpleSelector::HasAttribute(body.to_string()),
            }
        } else {
            SimpleSelector::Tag(token.to_string())
        }
    }

    /// Test this token against one element
    pub fn matches(&self, el: &ElementData) -> bool {
        match self {
            SimpleSelector::Tag(tag) => el.tag_name == *tag,
            SimpleSelector::Id(id) => el.attr("id") == Some(id.as_str()),
            SimpleSelector::Class(class) => el
                .attr("class")
                .is_some_and(|value| value.contains(class.as_str())),
            SimpleSelector::HasAttribute(name) => el.attributes.contains_key(name),
            SimpleSelector::AttributeEquals { name, value } => {
                el.attr(name) == Some(value.as_str())
            }
            SimpleSelector::Combinator(_) => false,
        }
    }
}

impl fmt::Display for SimpleSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimpleSelector::Tag(tag) => write!(f, "{}", tag),
            SimpleSelector::Id(id) => write!(f, "#{}", id),
            SimpleSelector::Class(class) => write!(f, ".{}", class),
            SimpleSelector::HasAttribute(name) => write!(f, "[{}]", name),
            SimpleSelector::AttributeEquals { name, value } => {
                write!(f, "[{}=\"{}\"]", name, value)
            }
            SimpleSelector::Combinator(c) => write!(f, "{}", c.symbol()),
        }
    }
}

/// A compound selector: all parts must hold for the same element
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selector {
    parts: Vec<SimpleSelector>,
}

impl Selector {
    /// Parse a selector string. Never fails; an empty string yields a
    /// selector with no parts, which every element satisfies.
    pub fn parse(input: &str) -> Self {
        Self {
            parts: input.split_whitespace().map(SimpleSelector::parse).collect(),
        }
    }

    pub fn parts(&self) -> &[SimpleSelector] {
        &self.parts
    }

    /// True iff `node` is an element and every part matches it
    pub fn matches(&self, node: &DomNode) -> bool {
        match node.as_element() {
            Some(el) => self.parts.iter().all(|part| part.matches(el)),
            None => false,
        }
    }

    /// Every matching element under `start_id` (inclusive), in document order
    pub fn query_all(&self, arena: &DomArena, start_id: NodeId) -> Vec<NodeId> {
        arena.find(start_id, |node| self.matches(node))
    }

    /// First matching element in document order
    pub fn query_first(&self, arena: &DomArena, start_id: NodeId) -> Option<NodeId> {
        arena.find_one(start_id, |node| self.matches(node))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", part)?;
        }
        Ok(())
    }
}

impl From<&str> for Selector {
    fn from(input: &str) -> Self {
        Selector::parse(input)
    }
}
