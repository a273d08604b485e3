//! Backend abstraction over a live document-automation driver.
//!
//! Fathom never talks to a browser directly. Everything it needs from the
//! outside world goes through [`Backend`]: locating nodes, switching into
//! frames and shadow roots, primitive interactions and readers, and script
//! execution.
//!
//! Implementations:
//! - A WebDriver or CDP adapter supplied by the consumer
//! - [`crate::mock::MockBackend`] for unit testing

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geometry::Rect;
use crate::result::FathomResult;

/// How a selector string is interpreted by the backend.
///
/// The string forms match the W3C WebDriver location strategies where
/// one exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectorKind {
    /// Element `id` attribute
    Id,
    /// Element `name` attribute
    Name,
    /// Single class name
    ClassName,
    /// Tag name
    TagName,
    /// CSS selector
    Css,
    /// XPath expression
    XPath,
}

impl SelectorKind {
    /// Strategy name as used in locator display forms
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::ClassName => "class name",
            Self::TagName => "tag name",
            Self::Css => "css selector",
            Self::XPath => "xpath",
        }
    }
}

impl fmt::Display for SelectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque reference to a node located by the backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle {
    id: String,
}

impl ElementHandle {
    /// Wrap a backend-specific element reference
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Backend-specific element reference
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Argument passed to [`Backend::execute_script`]
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptArg {
    /// A located element, exposed to the script as a DOM node
    Element(ElementHandle),
    /// Any JSON-representable value
    Value(serde_json::Value),
}

impl From<&ElementHandle> for ScriptArg {
    fn from(handle: &ElementHandle) -> Self {
        Self::Element(handle.clone())
    }
}

impl From<serde_json::Value> for ScriptArg {
    fn from(value: serde_json::Value) -> Self {
        Self::Value(value)
    }
}

/// Synchronous document-automation driver.
///
/// Every call may fail; failures are ordinary errors that the retry engine
/// retries and wraps. Implementations must be shareable across threads, but
/// the engine never calls one concurrently from a single resolution.
pub trait Backend: Send + Sync {
    /// Locate all nodes matching `value` within `context`, or within the
    /// current document when `context` is `None`.
    fn query_all(
        &self,
        context: Option<&ElementHandle>,
        kind: SelectorKind,
        value: &str,
    ) -> FathomResult<Vec<ElementHandle>>;

    /// Switch into the document of a frame element
    fn enter_frame(&self, frame: &ElementHandle) -> FathomResult<()>;

    /// Leave any entered frame and return to the top-level document
    fn exit_to_top_document(&self) -> FathomResult<()>;

    /// Whether the element hosts its own document
    fn is_frame_like(&self, handle: &ElementHandle) -> FathomResult<bool> {
        let tag = self.tag_name(handle)?.to_ascii_lowercase();
        Ok(tag == "iframe" || tag == "frame")
    }

    /// Whether the element exposes an isolated sub-tree (shadow root)
    fn has_isolated_subtree(&self, handle: &ElementHandle) -> FathomResult<bool>;

    /// Context handle for querying inside the element's isolated sub-tree
    fn enter_isolated_subtree(&self, handle: &ElementHandle) -> FathomResult<ElementHandle>;

    /// Click
    fn click(&self, handle: &ElementHandle) -> FathomResult<()>;

    /// Move the pointer over the element
    fn hover(&self, handle: &ElementHandle) -> FathomResult<()>;

    /// Secondary click
    fn context_click(&self, handle: &ElementHandle) -> FathomResult<()>;

    /// Double click
    fn double_click(&self, handle: &ElementHandle) -> FathomResult<()>;

    /// Press and hold
    fn long_click(&self, handle: &ElementHandle) -> FathomResult<()>;

    /// Type text into the element
    fn send_keys(&self, handle: &ElementHandle, text: &str) -> FathomResult<()>;

    /// Clear an editable element
    fn clear(&self, handle: &ElementHandle) -> FathomResult<()>;

    /// Submit the form the element belongs to
    fn submit(&self, handle: &ElementHandle) -> FathomResult<()>;

    /// Drag the element onto `target`
    fn drag_to(&self, handle: &ElementHandle, target: &ElementHandle) -> FathomResult<()>;

    /// Rendered text content
    fn text(&self, handle: &ElementHandle) -> FathomResult<String>;

    /// Lower- or upper-case tag name as reported by the document
    fn tag_name(&self, handle: &ElementHandle) -> FathomResult<String>;

    /// Whether the element is rendered visible
    fn is_displayed(&self, handle: &ElementHandle) -> FathomResult<bool>;

    /// Whether the element accepts input
    fn is_enabled(&self, handle: &ElementHandle) -> FathomResult<bool>;

    /// Whether a checkbox, radio or option is selected
    fn is_selected(&self, handle: &ElementHandle) -> FathomResult<bool>;

    /// Attribute or property value, `None` when absent
    fn attribute(&self, handle: &ElementHandle, name: &str) -> FathomResult<Option<String>>;

    /// Computed CSS property value
    fn css_property(&self, handle: &ElementHandle, name: &str) -> FathomResult<String>;

    /// Bounding client rectangle
    fn bounding_rect(&self, handle: &ElementHandle) -> FathomResult<Rect>;

    /// Run a script in the current document and return its JSON result
    fn execute_script(&self, script: &str, args: &[ScriptArg]) -> FathomResult<serde_json::Value>;

    /// PNG screenshot of the element
    fn screenshot(&self, handle: &ElementHandle) -> FathomResult<Vec<u8>>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod selector_kind {
        use super::*;

        #[test]
        fn test_strategy_names() {
            assert_eq!(SelectorKind::Id.as_str(), "id");
            assert_eq!(SelectorKind::ClassName.to_string(), "class name");
            assert_eq!(SelectorKind::TagName.to_string(), "tag name");
            assert_eq!(SelectorKind::Css.to_string(), "css selector");
            assert_eq!(SelectorKind::XPath.to_string(), "xpath");
        }
    }

    mod element_handle {
        use super::*;

        #[test]
        fn test_identity_by_id() {
            let a = ElementHandle::new("e1");
            let b = ElementHandle::new(String::from("e1"));
            assert_eq!(a, b);
            assert_eq!(a.id(), "e1");
            assert_eq!(a.to_string(), "e1");
        }

        #[test]
        fn test_script_arg_from_handle() {
            let handle = ElementHandle::new("e2");
            assert_eq!(ScriptArg::from(&handle), ScriptArg::Element(handle));
        }
    }
}
