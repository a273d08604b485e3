//! Resolution nodes: lazily resolved, addressable points in the document.
//!
//! A [`UiElement`] is a locator plus an optional parent and an index. It
//! never caches a backend handle; every action or assertion resolves the
//! whole chain again from the top, so a re-rendered document is always
//! seen fresh.
//!
//! ```
//! use std::sync::Arc;
//! use fathom::{Locator, Session};
//! use fathom::mock::MockBackend;
//!
//! let session = Session::new(Arc::new(MockBackend::new()));
//! let form = session.find(Locator::id("login"));
//! let submit = form.find(Locator::css("button[type=submit]"));
//! assert_eq!(
//!     submit.name_path(),
//!     "UiElement(By.id(login))[0] > UiElement(By.css selector(button[type=submit]))[0]"
//! );
//! ```

use std::fmt;
use std::sync::Arc;

use crate::assertion::ElementAssertion;
use crate::locator::Locator;
use crate::result::FathomResult;
use crate::session::Session;

struct Node {
    session: Session,
    locator: Locator,
    parent: Option<UiElement>,
    index: isize,
    name: Option<String>,
}

/// A lazily resolved element: locator, optional parent and index
#[derive(Clone)]
pub struct UiElement {
    node: Arc<Node>,
}

impl UiElement {
    pub(crate) fn root(session: Session, locator: Locator, name: Option<String>) -> Self {
        Self::new(session, locator, None, 0, name)
    }

    fn new(
        session: Session,
        locator: Locator,
        parent: Option<Self>,
        index: isize,
        name: Option<String>,
    ) -> Self {
        Self {
            node: Arc::new(Node {
                session,
                locator,
                parent,
                index,
                name,
            }),
        }
    }

    /// Child element located relative to this one
    #[must_use]
    pub fn find(&self, locator: impl Into<Locator>) -> Self {
        Self::new(
            self.node.session.clone(),
            locator.into(),
            Some(self.clone()),
            0,
            None,
        )
    }

    /// Child element with a display name used in failure messages
    #[must_use]
    pub fn find_named(&self, locator: impl Into<Locator>, name: impl Into<String>) -> Self {
        Self::new(
            self.node.session.clone(),
            locator.into(),
            Some(self.clone()),
            0,
            Some(name.into()),
        )
    }

    /// The same locator at another index.
    ///
    /// Negative indexes count from the end; `-1` is the last match. The
    /// display name override is not carried over.
    #[must_use]
    pub fn get(&self, index: isize) -> Self {
        Self::new(
            self.node.session.clone(),
            self.node.locator.clone(),
            self.node.parent.clone(),
            index,
            None,
        )
    }

    /// First match
    #[must_use]
    pub fn first(&self) -> Self {
        self.get(0)
    }

    /// Last match
    #[must_use]
    pub fn last(&self) -> Self {
        self.get(-1)
    }

    /// Number of current matches, queried once without retrying
    pub fn count(&self) -> FathomResult<usize> {
        Ok(self.resolve_all()?.len())
    }

    /// One element per current match
    pub fn list(&self) -> FathomResult<Vec<Self>> {
        let count = self.count()?;
        Ok((0..count).map(|i| self.get(i as isize)).collect())
    }

    /// Iterate over the current matches
    pub fn iter(&self) -> FathomResult<std::vec::IntoIter<Self>> {
        Ok(self.list()?.into_iter())
    }

    /// Raising assertions: failures become errors
    #[must_use]
    pub fn expect(&self) -> ElementAssertion {
        ElementAssertion::new(self.clone(), true)
    }

    /// Non-raising assertions: failures become `Ok(false)`
    #[must_use]
    pub fn wait_for(&self) -> ElementAssertion {
        ElementAssertion::new(self.clone(), false)
    }

    /// Locator of this element
    #[must_use]
    pub fn locator(&self) -> &Locator {
        &self.node.locator
    }

    /// Parent element, if any
    #[must_use]
    pub fn parent(&self) -> Option<&Self> {
        self.node.parent.as_ref()
    }

    /// Index among matches
    #[must_use]
    pub fn index(&self) -> isize {
        self.node.index
    }

    /// Owning session
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.node.session
    }

    /// Display name: the override, or `UiElement(<locator>)[<index>]`
    #[must_use]
    pub fn name(&self) -> String {
        match &self.node.name {
            Some(name) => name.clone(),
            None => format!("UiElement({})[{}]", self.node.locator, self.node.index),
        }
    }

    /// Names from the root down to this element
    #[must_use]
    pub fn name_trail(&self) -> Vec<String> {
        let mut trail = match &self.node.parent {
            Some(parent) => parent.name_trail(),
            None => Vec::new(),
        };
        trail.push(self.name());
        trail
    }

    /// Names from the root down to this element, joined with ` > `
    #[must_use]
    pub fn name_path(&self) -> String {
        self.name_trail().join(" > ")
    }
}

impl PartialEq for UiElement {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
            || (self.node.locator == other.node.locator
                && self.node.index == other.node.index
                && self.node.parent == other.node.parent)
    }
}

impl fmt::Debug for UiElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiElement")
            .field("locator", &self.node.locator)
            .field("index", &self.node.index)
            .field("name", &self.node.name)
            .field("parent", &self.node.parent)
            .finish()
    }
}

impl fmt::Display for UiElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name_path())
    }
}
