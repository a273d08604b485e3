//! Structural XPath builder.
//!
//! Builds XPath expressions from a fluent chain instead of hand-written
//! strings:
//!
//! ```
//! use fathom::XPath;
//!
//! let xpath = XPath::at("button")
//!     .attribute("data-qa").present()
//!     .encloses("span")
//!     .text().be("Save");
//! assert_eq!(
//!     xpath.to_string(),
//!     "//button[@data-qa and descendant::span[.//text()='Save']]"
//! );
//! ```
//!
//! # Model
//!
//! The expression is a tree of nodes stored in an arena. Each node carries
//! a selector fragment, an optional position, inline predicates, enclosure
//! sub-trees (conditions that must hold below the node without moving the
//! selection) and an optional next node for sequential sub-selection.
//!
//! Two cursors drive the fluent API:
//! - `cursor` receives predicates and new enclosures
//! - `anchor` is the node the next `select` continues from
//!
//! `select` moves both to the new node. `encloses` only moves `cursor`,
//! so a `select` after an `encloses` continues from the enclosing node.
//! Serialization always starts at the root, so the string reflects every
//! predicate appended so far.

use std::fmt;

use crate::backend::SelectorKind;
use crate::locator::Locator;
use crate::result::{FathomError, FathomResult};

#[derive(Debug, Clone, PartialEq, Eq)]
struct PathNode {
    selector: String,
    position: Option<i32>,
    predicates: Vec<String>,
    encloses: Vec<usize>,
    next: Option<usize>,
}

impl PathNode {
    fn new(selector: String, position: Option<i32>) -> Self {
        Self {
            selector,
            position: position.map(|p| if p == 0 { 1 } else { p }),
            predicates: Vec::new(),
            encloses: Vec::new(),
            next: None,
        }
    }
}

/// Anything usable as a path fragment: strings or other path expressions
pub trait PathFragment {
    /// Raw fragment text before translation
    fn into_fragment(self) -> String;
}

impl PathFragment for &str {
    fn into_fragment(self) -> String {
        self.trim().to_string()
    }
}

impl PathFragment for String {
    fn into_fragment(self) -> String {
        self.trim().to_string()
    }
}

impl PathFragment for &String {
    fn into_fragment(self) -> String {
        self.trim().to_string()
    }
}

impl PathFragment for XPath {
    fn into_fragment(self) -> String {
        self.to_string()
    }
}

impl PathFragment for &XPath {
    fn into_fragment(self) -> String {
        self.to_string()
    }
}

/// A structural XPath expression under construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XPath {
    nodes: Vec<PathNode>,
    cursor: usize,
    anchor: usize,
}

impl XPath {
    /// Start an expression at `selector`.
    ///
    /// Bare tag names match anywhere in the document (`body` becomes
    /// `//body`), `./x` becomes `/x` and parenthesized unions pass through.
    #[must_use]
    pub fn at(selector: impl PathFragment) -> Self {
        Self::at_position(selector, None)
    }

    /// Start an expression at the `position`-th match of `selector`.
    ///
    /// Positions are 1-based; `0` means first and negative means last.
    #[must_use]
    pub fn at_nth(selector: impl PathFragment, position: i32) -> Self {
        Self::at_position(selector, Some(position))
    }

    fn at_position(selector: impl PathFragment, position: Option<i32>) -> Self {
        let selector = translate_sub_selection(&selector.into_fragment());
        Self {
            nodes: vec![PathNode::new(selector, position)],
            cursor: 0,
            anchor: 0,
        }
    }

    /// Continue with a sequential sub-selection
    #[must_use]
    pub fn select(self, selector: impl PathFragment) -> Self {
        self.select_position(selector, None)
    }

    /// Continue with the `position`-th match of a sub-selection
    #[must_use]
    pub fn select_nth(self, selector: impl PathFragment, position: i32) -> Self {
        self.select_position(selector, Some(position))
    }

    fn select_position(mut self, selector: impl PathFragment, position: Option<i32>) -> Self {
        let selector = translate_sub_selection(&selector.into_fragment());
        let idx = self.push(selector, position);
        self.nodes[self.anchor].next = Some(idx);
        self.cursor = idx;
        self.anchor = idx;
        self
    }

    /// Require a descendant matching `selector` without moving the selection.
    ///
    /// Predicates added afterwards apply to the enclosed node.
    #[must_use]
    pub fn encloses(self, selector: impl PathFragment) -> Self {
        self.encloses_position(selector, None)
    }

    /// Require the `position`-th descendant matching `selector`
    #[must_use]
    pub fn encloses_nth(self, selector: impl PathFragment, position: i32) -> Self {
        self.encloses_position(selector, Some(position))
    }

    fn encloses_position(mut self, selector: impl PathFragment, position: Option<i32>) -> Self {
        let selector = translate_inner_selection(&selector.into_fragment());
        let idx = self.push(selector, position);
        self.nodes[self.cursor].encloses.push(idx);
        self.cursor = idx;
        self
    }

    /// Select a following node.
    ///
    /// `/x` selects the following sibling `x`; `x` or `//x` selects any
    /// following `x`.
    #[must_use]
    pub fn following(self, selector: impl PathFragment) -> Self {
        self.sibling("following", selector, None)
    }

    /// Select the `position`-th following node
    #[must_use]
    pub fn following_nth(self, selector: impl PathFragment, position: i32) -> Self {
        self.sibling("following", selector, Some(position))
    }

    /// Select a preceding node, with the same sibling rules as [`Self::following`]
    #[must_use]
    pub fn preceding(self, selector: impl PathFragment) -> Self {
        self.sibling("preceding", selector, None)
    }

    /// Select the `position`-th preceding node.
    ///
    /// Reverse axes count outwards, so position 1 is the nearest match.
    #[must_use]
    pub fn preceding_nth(self, selector: impl PathFragment, position: i32) -> Self {
        self.sibling("preceding", selector, Some(position))
    }

    fn sibling(self, axis: &str, selector: impl PathFragment, position: Option<i32>) -> Self {
        let step = format!("/{axis}{}", translate_sibling(&selector.into_fragment()));
        self.select_position(step, position)
    }

    /// Start a predicate over an attribute.
    ///
    /// Names already ending in `)` are treated as function calls and used
    /// as is; anything else is prefixed with `@`.
    #[must_use]
    pub fn attribute(self, name: &str) -> AttributeTest {
        let name = name.trim();
        let attribute = if name.ends_with(')') {
            name.to_string()
        } else {
            format!("@{name}")
        };
        AttributeTest {
            xpath: self,
            attribute,
        }
    }

    /// Start a predicate over the node's text content
    #[must_use]
    pub fn text(self) -> AttributeTest {
        AttributeTest {
            xpath: self,
            attribute: ".//text()".to_string(),
        }
    }

    /// Require `@id` to equal `value`
    #[must_use]
    pub fn id(self, value: &str) -> Self {
        self.attribute("id").be(value)
    }

    /// Require `@name` to equal `value`
    #[must_use]
    pub fn name(self, value: &str) -> Self {
        self.attribute("name").be(value)
    }

    /// Require every class in `classes` to be present in `@class`
    #[must_use]
    pub fn classes<S: AsRef<str>>(self, classes: &[S]) -> Self {
        self.attribute("class").has_words(classes)
    }

    fn push(&mut self, selector: String, position: Option<i32>) -> usize {
        self.nodes.push(PathNode::new(selector, position));
        self.nodes.len() - 1
    }

    fn add_predicate(mut self, predicate: String) -> Self {
        self.nodes[self.cursor].predicates.push(predicate);
        self
    }

    fn build(&self, idx: usize, out: &mut String) {
        let node = &self.nodes[idx];
        out.push_str(&node.selector);

        if !node.predicates.is_empty() || !node.encloses.is_empty() {
            let mut conditions = node.predicates.clone();
            for &inner in &node.encloses {
                let mut built = String::new();
                self.build(inner, &mut built);
                conditions.push(built);
            }
            out.push('[');
            out.push_str(&conditions.join(" and "));
            out.push(']');
        }

        match node.position {
            Some(p) if p < 0 => out.push_str("[last()]"),
            Some(p) => {
                out.push('[');
                out.push_str(&p.to_string());
                out.push(']');
            }
            None => {}
        }

        if let Some(next) = node.next {
            self.build(next, out);
        }
    }
}

impl fmt::Display for XPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.build(0, &mut out);
        f.write_str(&out)
    }
}

impl TryFrom<&Locator> for XPath {
    type Error = FathomError;

    fn try_from(locator: &Locator) -> FathomResult<Self> {
        let value = locator.value();
        let xpath = match locator.kind() {
            SelectorKind::XPath => Self::at(value),
            SelectorKind::TagName => Self::at(value),
            SelectorKind::Id => Self::at("*").id(value),
            SelectorKind::Name => Self::at("*").name(value),
            SelectorKind::ClassName => Self::at("*").attribute("class").be(value),
            SelectorKind::Css => {
                return Err(FathomError::config(
                    "locator",
                    format!("{locator} has no XPath equivalent"),
                ))
            }
        };
        Ok(xpath)
    }
}

/// Pending predicate over an attribute or text, finished by one of its
/// comparison methods
#[derive(Debug, Clone)]
pub struct AttributeTest {
    xpath: XPath,
    attribute: String,
}

impl AttributeTest {
    /// Attribute equals `value`
    #[must_use]
    pub fn be(self, value: &str) -> XPath {
        let predicate = format!("{}={}", self.attribute, quote(value));
        self.xpath.add_predicate(predicate)
    }

    /// Attribute exists
    #[must_use]
    pub fn present(self) -> XPath {
        let predicate = self.attribute;
        self.xpath.add_predicate(predicate)
    }

    /// Attribute contains `value`
    #[must_use]
    pub fn contains(self, value: &str) -> XPath {
        self.matches("contains", value)
    }

    /// Attribute starts with `value`
    #[must_use]
    pub fn starts_with(self, value: &str) -> XPath {
        self.matches("starts-with", value)
    }

    /// Attribute ends with `value`
    #[must_use]
    pub fn ends_with(self, value: &str) -> XPath {
        self.matches("ends-with", value)
    }

    /// Attribute contains every word as a whitespace-separated token
    #[must_use]
    pub fn has_words<S: AsRef<str>>(self, words: &[S]) -> XPath {
        let Self {
            mut xpath,
            attribute,
        } = self;
        for word in words {
            let token = format!(" {} ", word.as_ref());
            xpath = xpath.add_predicate(format!(
                "contains(concat(' ', normalize-space({attribute}), ' '), {})",
                quote(&token)
            ));
        }
        xpath
    }

    fn matches(self, operation: &str, value: &str) -> XPath {
        let predicate = format!("{operation}({},{})", self.attribute, quote(value));
        self.xpath.add_predicate(predicate)
    }
}

fn translate_sub_selection(selector: &str) -> String {
    if selector.starts_with('(') {
        selector.to_string()
    } else if let Some(rest) = selector.strip_prefix("./") {
        format!("/{rest}")
    } else if selector.starts_with('/') {
        selector.to_string()
    } else {
        format!("//{selector}")
    }
}

fn translate_inner_selection(selector: &str) -> String {
    if let Some(rest) = selector.strip_prefix("//") {
        format!("descendant::{rest}")
    } else if let Some(rest) = selector.strip_prefix('/') {
        format!("child::{rest}")
    } else if let Some(rest) = selector.strip_prefix("./") {
        format!("child::{rest}")
    } else {
        format!("descendant::{selector}")
    }
}

fn translate_sibling(selector: &str) -> String {
    if selector.starts_with("//") {
        format!("::{}", selector.trim_start_matches('/'))
    } else if selector.starts_with('/') {
        format!("-sibling::{}", selector.trim_start_matches('/'))
    } else {
        format!("::{selector}")
    }
}

/// Quote a string literal for XPath 1.0, which has no escape sequences
fn quote(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{value}'")
    } else if !value.contains('"') {
        format!("\"{value}\"")
    } else {
        let parts: Vec<String> = value.split('\'').map(|part| format!("'{part}'")).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}
