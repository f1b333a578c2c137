//! CSS-subset selectors over the document model.
//!
//! Supported grammar: whitespace-separated descendant chains of simple
//! selectors, each `tag`, `#id`, `.class`, `[attr]`, or `[attr='value']`
//! in any combination. This is the single selector scheme the matcher
//! supports; anything richer is rejected at parse time.

use crate::dom::{Document, NodeId};
use thiserror::Error;

/// Selector parse errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SelectorError {
    #[error("Selector is empty")]
    Empty,

    #[error("Unterminated attribute selector in '{0}'")]
    UnterminatedAttribute(String),

    #[error("Unexpected character '{ch}' in selector '{input}'")]
    UnexpectedCharacter { ch: char, input: String },
}

/// A parsed selector: a descendant chain of simple selectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    parts: Vec<SimpleSelector>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct SimpleSelector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    /// Attribute constraints; `None` value means presence-only.
    attrs: Vec<(String, Option<String>)>,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let mut parts = Vec::new();
        for token in input.split_whitespace() {
            parts.push(SimpleSelector::parse(token)?);
        }
        if parts.is_empty() {
            return Err(SelectorError::Empty);
        }
        Ok(Self { parts })
    }

    /// Whether `node` matches this selector: the last simple selector must
    /// match the node itself and the preceding ones must match ancestors
    /// in order.
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let last = self.parts.len() - 1;
        if !self.parts[last].matches(doc, node) {
            return false;
        }
        let mut remaining = last;
        let mut current = doc.parent(node);
        while remaining > 0 {
            let Some(ancestor) = current else {
                return false;
            };
            if self.parts[remaining - 1].matches(doc, ancestor) {
                remaining -= 1;
            }
            current = doc.parent(ancestor);
        }
        true
    }
}

impl SimpleSelector {
    fn parse(token: &str) -> Result<Self, SelectorError> {
        let mut selector = SimpleSelector::default();
        let mut chars = token.chars().peekable();
        let mut tag = String::new();

        while let Some(&ch) = chars.peek() {
            match ch {
                '.' => {
                    chars.next();
                    selector.classes.push(take_name(&mut chars));
                }
                '#' => {
                    chars.next();
                    selector.id = Some(take_name(&mut chars));
                }
                '[' => {
                    chars.next();
                    let mut body = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == ']' {
                            closed = true;
                            break;
                        }
                        body.push(c);
                    }
                    if !closed {
                        return Err(SelectorError::UnterminatedAttribute(token.to_string()));
                    }
                    selector.attrs.push(parse_attr(&body));
                }
                c if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '*' => {
                    chars.next();
                    if c != '*' {
                        tag.push(c.to_ascii_lowercase());
                    }
                }
                other => {
                    return Err(SelectorError::UnexpectedCharacter {
                        ch: other,
                        input: token.to_string(),
                    });
                }
            }
        }

        if !tag.is_empty() {
            selector.tag = Some(tag);
        }
        Ok(selector)
    }

    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        if let Some(tag) = &self.tag {
            if !doc.tag(node).eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if doc.attr(node, "id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| doc.has_class(node, c)) {
            return false;
        }
        self.attrs.iter().all(|(name, value)| match value {
            Some(expected) => doc.attr(node, name) == Some(expected.as_str()),
            None => doc.attr(node, name).is_some(),
        })
    }
}

fn take_name(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            name.push(c);
            chars.next();
        } else {
            break;
        }
    }
    name
}

fn parse_attr(body: &str) -> (String, Option<String>) {
    match body.split_once('=') {
        Some((name, raw)) => {
            let value = raw
                .trim_matches(|c| c == '\'' || c == '"')
                .to_string();
            (name.trim().to_string(), Some(value))
        }
        None => (body.trim().to_string(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::NodeSnapshot;
    use triage_protocol::defaults::{DEFAULT_ERROR_SELECTOR, DEFAULT_ROW_SELECTOR};

    fn doc() -> Document {
        let snapshot = NodeSnapshot::element("body").with_child(
            NodeSnapshot::element("tr").with_child(
                NodeSnapshot::element("td")
                    .with_attr("data-controller", "components--rich-text")
                    .with_class("cell")
                    .with_child(
                        NodeSnapshot::element("h3")
                            .with_child(NodeSnapshot::element("strong").with_text("FAIL")),
                    )
                    .with_child(
                        NodeSnapshot::element("code")
                            .with_child(NodeSnapshot::element("strong").with_text("boom")),
                    ),
            ),
        );
        Document::from_snapshot("about:blank", &snapshot)
    }

    #[test]
    fn test_parse_default_selectors() {
        assert!(Selector::parse(DEFAULT_ROW_SELECTOR).is_ok());
        assert!(Selector::parse(DEFAULT_ERROR_SELECTOR).is_ok());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Selector::parse("   "), Err(SelectorError::Empty));
        assert!(matches!(
            Selector::parse("[data-controller='x'"),
            Err(SelectorError::UnterminatedAttribute(_))
        ));
        assert!(matches!(
            Selector::parse("div > span"),
            Err(SelectorError::UnexpectedCharacter { ch: '>', .. })
        ));
    }

    #[test]
    fn test_descendant_chain_with_attribute() {
        let doc = doc();
        let selector =
            Selector::parse("[data-controller='components--rich-text'] h3 strong").unwrap();
        let hits = doc.query_selector_all(&selector);
        assert_eq!(hits.len(), 1);
        assert_eq!(doc.text_content(hits[0]), "FAIL");
    }

    #[test]
    fn test_descendant_requires_matching_ancestor() {
        let doc = doc();
        // `code strong` matches the error strong but not the row strong.
        let selector = Selector::parse("code strong").unwrap();
        let hits = doc.query_selector_all(&selector);
        assert_eq!(hits.len(), 1);
        assert_eq!(doc.text_content(hits[0]), "boom");
    }

    #[test]
    fn test_class_and_presence_attribute() {
        let doc = doc();
        assert_eq!(doc.query_selector_all(&Selector::parse("td.cell").unwrap()).len(), 1);
        assert_eq!(
            doc.query_selector_all(&Selector::parse("[data-controller]").unwrap()).len(),
            1
        );
        assert!(doc
            .query_selector_all(&Selector::parse("td.missing").unwrap())
            .is_empty());
    }

    #[test]
    fn test_tag_match_is_case_insensitive() {
        let doc = doc();
        assert_eq!(doc.query_selector_all(&Selector::parse("TR").unwrap()).len(), 1);
    }
}
