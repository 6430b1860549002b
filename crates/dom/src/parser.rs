//! Markup parser
//!
//! A lenient, non-validating scanner for a simplified HTML/XML dialect.
//! Everything parsed lands under the arena's synthetic root element.
//!
//! At each `<`, in priority order:
//!
//! ```text
//! <!-- ... -->        skipped (unterminated: skips to end of input)
//! <![CDATA[ ... ]]>   CDATA node, content verbatim
//! <! ... >            skipped (doctype and friends, unterminated CDATA)
//! </ ... >            closes the current element, whatever its name
//! <name a="v" ...>    element; `/>` makes it a leaf
//! ```
//!
//! Text between tags becomes a text node unless it is whitespace only.
//! Malformed input never fails: it just produces less tree.
//!
//! Open elements are tracked on an explicit stack instead of recursing, so
//! deeply nested input cannot overflow the call stack.

use crate::arena::DomArena;
use crate::types::{ElementData, NodeId, NodeKind};

const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";
const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

/// Parser configuration
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Deepest nesting at which an element may still hold children. Open
    /// tags below that become leaves and their content goes to the
    /// enclosing element.
    pub max_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self { max_depth: 512 }
    }
}

/// Markup parser
#[derive(Debug, Clone, Default)]
pub struct MarkupParser {
    config: ParserConfig,
}

impl MarkupParser {
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse `input` into a fresh arena
    pub fn parse(&self, input: &str) -> DomArena {
        let mut arena = DomArena::with_capacity(input.len() / 16 + 1);
        self.parse_into(input, &mut arena);
        arena
    }

    /// Parse `input`, appending the forest under `arena`'s root
    pub fn parse_into(&self, input: &str, arena: &mut DomArena) {
        let mut stack: Vec<NodeId> = vec![arena.root_id()];
        let mut pos = 0;
        let mut flattened = 0usize;
        // Flattened elements whose end tag has not been seen yet
        let mut pending_leaves = 0usize;

        while pos < input.len() {
            let rest = &input[pos..];
            let Some(offset) = rest.find('<') else {
                push_text(arena, top(&stack), rest);
                break;
            };
            if offset > 0 {
                push_text(arena, top(&stack), &rest[..offset]);
            }
            let open = pos + offset;
            let tail = &input[open..];

            if tail.starts_with(COMMENT_OPEN) {
                pos = match tail.find(COMMENT_CLOSE) {
                    Some(end) => open + end + COMMENT_CLOSE.len(),
                    None => input.len(),
                };
                continue;
            }

            if tail.starts_with(CDATA_OPEN) {
                if let Some(end) = tail.find(CDATA_CLOSE) {
                    let content = &tail[CDATA_OPEN.len()..end];
                    append(arena, top(&stack), NodeKind::Cdata(content.to_string()));
                    pos = open + end + CDATA_CLOSE.len();
                    continue;
                }
                // Unterminated: fall through and skip it like any `<!`
            }

            if tail.starts_with("<!") {
                pos = skip_past_gt(input, open);
                continue;
            }

            if tail[1..].starts_with('/') {
                pos = skip_past_gt(input, open);
                if pending_leaves > 0 {
                    pending_leaves -= 1;
                    continue;
                }
                if stack.len() == 1 {
                    tracing::debug!(offset = open, "stray end tag at top level, stopping");
                    break;
                }
                stack.pop();
                continue;
            }

            let Some(close) = tail.find('>') else {
                // Unterminated tag swallows the rest of the input
                break;
            };
            pos = open + close + 1;

            let mut content = &tail[1..close];
            let self_closing = content.ends_with('/');
            if self_closing {
                content = &content[..content.len() - 1];
            }

            let element = parse_tag(content);
            if element.tag_name.is_empty() {
                tracing::debug!(offset = open, "tag without a name, skipped");
                continue;
            }

            let id = append(arena, top(&stack), NodeKind::Element(element));
            if self_closing {
                continue;
            }
            if stack.len() > self.config.max_depth {
                flattened += 1;
                pending_leaves += 1;
                continue;
            }
            stack.push(id);
        }

        if flattened > 0 {
            tracing::warn!(
                max_depth = self.config.max_depth,
                flattened,
                "nesting limit reached, deep elements parsed as leaves"
            );
        }
        tracing::debug!(nodes = arena.len(), bytes = input.len(), "parsed markup");
    }
}

fn top(stack: &[NodeId]) -> NodeId {
    stack[stack.len() - 1]
}

/// Link a brand-new node under `parent`. A fresh node cannot create a
/// cycle, so this skips the checks `DomArena::append_child` does.
fn append(arena: &mut DomArena, parent: NodeId, kind: NodeKind) -> NodeId {
    let id = arena.add_node(kind);
    if let Ok(parent_node) = arena.get_mut(parent) {
        parent_node.children_ids.push(id);
    }
    if let Ok(node) = arena.get_mut(id) {
        node.parent_id = Some(parent);
    }
    id
}

/// Add a text run, dropping whitespace-only runs and merging with a
/// preceding text sibling (a skipped comment can split one run in two).
fn push_text(arena: &mut DomArena, parent: NodeId, text: &str) {
    if text.trim().is_empty() {
        return;
    }

    let last = arena
        .get(parent)
        .ok()
        .and_then(|node| node.children_ids.last().copied());
    if let Some(last) = last {
        if let Ok(node) = arena.get_mut(last) {
            if let NodeKind::Text(existing) = &mut node.kind {
                existing.push_str(text);
                return;
            }
        }
    }

    append(arena, parent, NodeKind::Text(text.to_string()));
}

/// Position just past the next `>` at or after `from`, or end of input
fn skip_past_gt(input: &str, from: usize) -> usize {
    match input[from..].find('>') {
        Some(gt) => from + gt + 1,
        None => input.len(),
    }
}

/// Split tag content (between `<` and `>`, minus any trailing `/`) into a
/// tag name and its attributes
fn parse_tag(content: &str) -> ElementData {
    let (name, attrs) = match content.find(char::is_whitespace) {
        Some(split) => (&content[..split], &content[split..]),
        None => (content, ""),
    };

    let mut element = ElementData::new(name);
    for (key, value) in AttributeScanner::new(attrs) {
        element.set_attr(key, value);
    }
    element
}

/// Iterator over `name="value"` pairs
///
/// Stops for good at the first malformed attribute (no `=`, an unquoted
/// value such as `y=2`, or a quote that never closes): the rest of that
/// tag's attributes are lost. Unquoted values are not folded into the next
/// attribute's name.
struct AttributeScanner<'a> {
    rest: &'a str,
}

impl<'a> AttributeScanner<'a> {
    fn new(input: &'a str) -> Self {
        Self { rest: input }
    }
}

impl<'a> Iterator for AttributeScanner<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.rest.trim_start();
        self.rest = "";

        let eq = rest.find('=')?;
        let name = rest[..eq].trim();
        let after = rest[eq + 1..].trim_start();

        let quoted = after.strip_prefix('"')?;
        let close = quoted.find('"')?;

        self.rest = &quoted[close + 1..];
        Some((name, &quoted[..close]))
    }
}
