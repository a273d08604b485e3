//! Fathom: lazy element locators with retrying actions and assertions
//!
//! Fathom is a declarative querying and verification layer over a
//! document-automation [`Backend`]. Elements are described, not looked up:
//! a [`UiElement`] is resolved against the live document only when an
//! action or assertion needs it, and every such operation is retried until
//! it succeeds or the thread's retry budget is spent.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────────┐   ┌──────────────────┐   ┌────────────┐
//! │ Locator  │──►│ UiElement   │──►│ Actions /        │──►│ Listener   │
//! │ XPath    │   │ resolution  │   │ Assertions       │   │ hooks      │
//! └──────────┘   └──────┬──────┘   └────────┬─────────┘   └────────────┘
//!                       │                   │
//!                       ▼                   ▼
//!                  ┌─────────┐        ┌───────────┐
//!                  │ Backend │        │ Sequence  │
//!                  └─────────┘        │ (retry)   │
//!                                     └───────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use fathom::{Locator, SelectorKind, Session};
//! use fathom::mock::{MockBackend, MockElement, Scope};
//! use fathom::retry::{self, Overrides};
//!
//! let backend = Arc::new(MockBackend::new());
//! backend.add_element("save", MockElement::new("button").with_text("Save"));
//! backend.respond(Scope::Document, SelectorKind::Css, "button", &["save"]);
//!
//! let session = Session::new(backend.clone());
//! let save = session.find_named("button", "Save button");
//!
//! retry::with_config(Overrides::new().retry_count(0), || {
//!     save.click()?;
//!     save.expect().text().be("Save")
//! })
//! .unwrap();
//! assert!(backend.was_called("click:save"));
//! ```

#![warn(missing_docs)]

mod action;
mod assertion;
mod backend;
mod element;
mod geometry;
mod listener;
mod locator;
/// Logging setup
pub mod logging;
/// In-memory backend for tests
pub mod mock;
mod resolve;
mod result;
/// Retry engine and thread-scoped configuration
pub mod retry;
/// Script snippets run through the backend
pub mod script;
mod session;
/// Settings loaded from the environment
pub mod settings;
mod xpath;

pub use assertion::{
    Assert, AssertKind, Binary, BinaryAssertion, Bounds, ElementAssertion, Format, Ordered,
    Quantity, QuantityAssertion, RectAssertion, StringAssertion, Text, Value,
};
pub use backend::{Backend, ElementHandle, ScriptArg, SelectorKind};
pub use element::UiElement;
pub use geometry::{Color, Location, Rect};
pub use listener::{AssertionInfo, HighlightListener, Listener, NoopListener, HIGHLIGHT_ACTION};
pub use locator::{Filter, Locator};
pub use result::{Exhausted, FathomError, FathomResult};
pub use retry::{Overrides, RetryConfig, ScopeGuard, Sequence};
pub use session::{Session, SessionBuilder};
pub use settings::Settings;
pub use xpath::{AttributeTest, PathFragment, XPath};

/// Commonly used types
pub mod prelude {
    pub use super::assertion::{
        BinaryAssertion, ElementAssertion, QuantityAssertion, RectAssertion, StringAssertion,
        Value,
    };
    pub use super::backend::*;
    pub use super::element::*;
    pub use super::geometry::*;
    pub use super::listener::{AssertionInfo, HighlightListener, Listener, NoopListener};
    pub use super::locator::*;
    pub use super::result::*;
    pub use super::retry::{self, Overrides, RetryConfig, Sequence};
    pub use super::session::*;
    pub use super::settings::Settings;
    pub use super::xpath::*;
}
