//! A hand-rolled matcher for the small slice of CSS selector syntax that
//! delegation actually needs: tag names, `#id`, `.class` (repeatable),
//! `[attr]`/`[attr=value]`, and the descendant (` `) and child (`>`)
//! combinators between compound selectors. This is deliberately not a general
//! CSS engine — delegation selectors are short, author-controlled strings,
//! not arbitrary stylesheets, so a small recursive matcher is the right size
//! for the job.

use crate::arena::{Document, NodeId};
use thiserror::Error;

/// A single `tag#id.class.class[attr][attr=value]` compound, with the
/// combinator that preceded it (`None` for the first compound in a selector).
#[derive(Debug, Clone, PartialEq, Eq)]
struct Compound {
    combinator: Option<Combinator>,
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    /// ` ` — any ancestor.
    Descendant,
    /// `>` — immediate parent.
    Child,
}

/// A parsed, ready-to-match delegation selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    compounds: Vec<Compound>,
}

/// Errors produced while parsing a selector string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("invalid selector syntax in {0:?}")]
    Syntax(String),
}

impl Selector {
    /// Parses a selector string. Reported as an [`SelectorError`] and, at the
    /// call site in the dispatcher, cached as "no match" for the offending
    /// target rather than retried every dispatch.
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        let trimmed = source.trim();
        if trimmed.is_empty() {
            return Err(SelectorError::Empty);
        }

        let mut compounds = Vec::new();
        let mut combinator = None;
        for token in tokenize(trimmed) {
            match token {
                Token::Combinator(c) => {
                    if combinator.is_some() {
                        return Err(SelectorError::Syntax(source.to_string()));
                    }
                    combinator = Some(c);
                }
                Token::Compound(text) => {
                    compounds.push(parse_compound(&text, combinator.take(), source)?);
                }
            }
        }
        if compounds.is_empty() {
            return Err(SelectorError::Syntax(source.to_string()));
        }
        Ok(Self {
            source: trimmed.to_string(),
            compounds,
        })
    }

    /// The original selector text, as given to [`Selector::parse`].
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Does `node` itself satisfy the *last* (rightmost) compound, and does
    /// the remainder of the selector resolve against its ancestors?
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.matches_from(doc, node, self.compounds.len() - 1)
    }

    fn matches_from(&self, doc: &Document, node: NodeId, compound_index: usize) -> bool {
        let compound = &self.compounds[compound_index];
        if !compound_matches(doc, node, compound) {
            return false;
        }
        if compound_index == 0 {
            return true;
        }
        let prev_index = compound_index - 1;
        match compound.combinator {
            Some(Combinator::Child) => match doc.parent(node) {
                Some(parent) => self.matches_from(doc, parent, prev_index),
                None => false,
            },
            Some(Combinator::Descendant) | None => {
                let mut current = doc.parent(node);
                while let Some(ancestor) = current {
                    if self.matches_from(doc, ancestor, prev_index) {
                        return true;
                    }
                    current = doc.parent(ancestor);
                }
                false
            }
        }
    }

    /// Walks from `target` (inclusive) toward the root, returning the nearest
    /// ancestor matching this selector that is at or under `root`, or `None`.
    pub fn closest(&self, doc: &Document, target: NodeId, root: NodeId) -> Option<NodeId> {
        let mut current = Some(target);
        while let Some(node) = current {
            if node == root {
                break;
            }
            if self.matches(doc, node) {
                return Some(node);
            }
            current = doc.parent(node);
        }
        None
    }
}

enum Token {
    Compound(String),
    Combinator(Combinator),
}

fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut current = String::new();
    let mut bracket_depth = 0u32;

    let mut flush = |current: &mut String, tokens: &mut Vec<Token>| {
        if !current.trim().is_empty() {
            tokens.push(Token::Compound(std::mem::take(current)));
        } else {
            current.clear();
        }
    };

    for c in source.chars() {
        match c {
            '[' => {
                bracket_depth += 1;
                current.push(c);
            }
            ']' => {
                bracket_depth = bracket_depth.saturating_sub(1);
                current.push(c);
            }
            '>' if bracket_depth == 0 => {
                flush(&mut current, &mut tokens);
                // A trailing descendant combinator before `>` is redundant.
                if matches!(tokens.last(), Some(Token::Combinator(Combinator::Descendant))) {
                    tokens.pop();
                }
                tokens.push(Token::Combinator(Combinator::Child));
            }
            c if c.is_whitespace() && bracket_depth == 0 => {
                flush(&mut current, &mut tokens);
                let last_was_compound = matches!(tokens.last(), Some(Token::Compound(_)));
                if last_was_compound {
                    tokens.push(Token::Combinator(Combinator::Descendant));
                }
            }
            c => current.push(c),
        }
    }
    flush(&mut current, &mut tokens);
    if matches!(tokens.last(), Some(Token::Combinator(_))) {
        tokens.pop();
    }
    tokens
}

fn parse_compound(
    text: &str,
    combinator: Option<Combinator>,
    original: &str,
) -> Result<Compound, SelectorError> {
    let mut tag = None;
    let mut id = None;
    let mut classes = Vec::new();
    let mut attrs = Vec::new();

    let mut rest = text;
    // Leading tag name (letters, digits, -, *), if any.
    let tag_len = rest
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '-' || *c == '_' || *c == '*')
        .count();
    if tag_len > 0 {
        let (head, tail) = rest.split_at(tag_len);
        if head != "*" {
            tag = Some(head.to_string());
        }
        rest = tail;
    }

    while !rest.is_empty() {
        match rest.chars().next().unwrap() {
            '#' => {
                let end = rest[1..]
                    .find(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_'))
                    .map(|i| i + 1)
                    .unwrap_or(rest.len());
                if end <= 1 {
                    return Err(SelectorError::Syntax(original.to_string()));
                }
                id = Some(rest[1..end].to_string());
                rest = &rest[end..];
            }
            '.' => {
                let end = rest[1..]
                    .find(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_'))
                    .map(|i| i + 1)
                    .unwrap_or(rest.len());
                if end <= 1 {
                    return Err(SelectorError::Syntax(original.to_string()));
                }
                classes.push(rest[1..end].to_string());
                rest = &rest[end..];
            }
            '[' => {
                let end = rest
                    .find(']')
                    .ok_or_else(|| SelectorError::Syntax(original.to_string()))?;
                let inner = &rest[1..end];
                if let Some(eq) = inner.find('=') {
                    let key = inner[..eq].trim().to_string();
                    let value = inner[eq + 1..].trim().trim_matches('"').trim_matches('\'');
                    attrs.push((key, Some(value.to_string())));
                } else {
                    attrs.push((inner.trim().to_string(), None));
                }
                rest = &rest[end + 1..];
            }
            _ => return Err(SelectorError::Syntax(original.to_string())),
        }
    }

    Ok(Compound {
        combinator,
        tag,
        id,
        classes,
        attrs,
    })
}

fn compound_matches(doc: &Document, node: NodeId, compound: &Compound) -> bool {
    let Some(n) = doc.get(node) else {
        return false;
    };
    if let Some(tag) = &compound.tag {
        if !n.tag.eq_ignore_ascii_case(tag) {
            return false;
        }
    }
    if let Some(id) = &compound.id {
        if n.id.as_deref() != Some(id.as_str()) {
            return false;
        }
    }
    for class in &compound.classes {
        if !n.classes.iter().any(|c| c == class) {
            return false;
        }
    }
    for (key, value) in &compound.attrs {
        match n.attrs.get(key) {
            Some(actual) => {
                if let Some(expected) = value {
                    if actual != expected {
                        return false;
                    }
                }
            }
            None => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_row() -> (Document, NodeId, NodeId) {
        let mut doc = Document::new("body");
        let row = doc.create_element("div");
        doc.add_class(row, "row");
        doc.append_child(doc.root(), row);
        let button = doc.create_element("button");
        doc.append_child(row, button);
        (doc, row, button)
    }

    #[test]
    fn child_combinator_requires_direct_parent() {
        let (doc, row, button) = build_row();
        let selector = Selector::parse(".row > button").unwrap();
        assert!(selector.matches(&doc, button));

        let mut doc2 = doc;
        let wrapper = doc2.create_element("span");
        doc2.detach(button);
        doc2.append_child(row, wrapper);
        doc2.append_child(wrapper, button);
        assert!(!selector.matches(&doc2, button));
    }

    #[test]
    fn descendant_combinator_matches_any_ancestor_depth() {
        let (mut doc, row, button) = build_row();
        let wrapper = doc.create_element("span");
        doc.detach(button);
        doc.append_child(row, wrapper);
        doc.append_child(wrapper, button);

        let selector = Selector::parse(".row button").unwrap();
        assert!(selector.matches(&doc, button));
    }

    #[test]
    fn closest_stops_at_configured_root() {
        let (doc, row, button) = build_row();
        let selector = Selector::parse(".row").unwrap();
        assert_eq!(selector.closest(&doc, button, row), None);
        assert_eq!(selector.closest(&doc, button, doc.root()), Some(row));
    }

    #[test]
    fn attribute_selector_with_value() {
        let mut doc = Document::new("body");
        let input = doc.create_element("input");
        doc.set_attr(input, "type", "checkbox");
        doc.append_child(doc.root(), input);

        assert!(Selector::parse("[type=checkbox]").unwrap().matches(&doc, input));
        assert!(!Selector::parse("[type=radio]").unwrap().matches(&doc, input));
        assert!(Selector::parse("[type]").unwrap().matches(&doc, input));
    }

    #[test]
    fn invalid_selector_is_reported_not_panicked() {
        assert!(Selector::parse("").is_err());
        assert!(Selector::parse("[unterminated").is_err());
    }
}
