//! Locators: immutable descriptions of how to find document nodes.
//!
//! A locator pairs a backend selector strategy with a selector string and
//! two optional refinements:
//!
//! - **Uniqueness**: resolution fails unless exactly one candidate matches
//! - **Filter**: a predicate over resolved candidates, applied before
//!   index selection
//!
//! Refinements return modified copies; a locator never changes after
//! construction.

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::backend::{Backend, ElementHandle, SelectorKind};
use crate::result::FathomResult;
use crate::xpath::XPath;

/// Predicate over a resolved candidate
pub type Filter = Arc<dyn Fn(&dyn Backend, &ElementHandle) -> FathomResult<bool> + Send + Sync>;

fn displayed_filter() -> Filter {
    static DISPLAYED: OnceLock<Filter> = OnceLock::new();
    DISPLAYED
        .get_or_init(|| -> Filter {
            Arc::new(|backend: &dyn Backend, handle: &ElementHandle| {
                backend.is_displayed(handle)
            })
        })
        .clone()
}

/// Description of how to find document nodes
#[derive(Clone)]
pub struct Locator {
    kind: SelectorKind,
    value: String,
    unique: bool,
    filter: Option<Filter>,
}

impl Locator {
    /// Locator with an explicit strategy
    #[must_use]
    pub fn new(kind: SelectorKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            unique: false,
            filter: None,
        }
    }

    /// Match by `id` attribute
    #[must_use]
    pub fn id(value: impl Into<String>) -> Self {
        Self::new(SelectorKind::Id, value)
    }

    /// Match by `name` attribute
    #[must_use]
    pub fn name(value: impl Into<String>) -> Self {
        Self::new(SelectorKind::Name, value)
    }

    /// Match by a single class name
    #[must_use]
    pub fn class_name(value: impl Into<String>) -> Self {
        Self::new(SelectorKind::ClassName, value)
    }

    /// Match by tag name
    #[must_use]
    pub fn tag_name(value: impl Into<String>) -> Self {
        Self::new(SelectorKind::TagName, value)
    }

    /// Match by CSS selector
    #[must_use]
    pub fn css(value: impl Into<String>) -> Self {
        Self::new(SelectorKind::Css, value)
    }

    /// Match by XPath expression
    #[must_use]
    pub fn xpath(value: impl Into<String>) -> Self {
        Self::new(SelectorKind::XPath, value)
    }

    /// Copy that fails resolution unless exactly one candidate matches
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Copy that keeps only candidates accepted by `predicate`
    #[must_use]
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&dyn Backend, &ElementHandle) -> FathomResult<bool> + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(predicate));
        self
    }

    /// Copy that keeps only displayed candidates.
    ///
    /// Every displayed locator shares one filter, so equal selectors
    /// compare equal.
    #[must_use]
    pub fn displayed(mut self) -> Self {
        self.filter = Some(displayed_filter());
        self
    }

    /// Selector strategy
    #[must_use]
    pub const fn kind(&self) -> SelectorKind {
        self.kind
    }

    /// Selector string
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether uniqueness is demanded
    #[must_use]
    pub const fn is_unique(&self) -> bool {
        self.unique
    }

    /// Whether a filter is set
    #[must_use]
    pub fn is_filtered(&self) -> bool {
        self.filter.is_some()
    }

    /// Selector string usable inside a context node.
    ///
    /// Absolute XPath expressions are made context-relative (`//x` becomes
    /// `.//x`); every other selector is returned unchanged.
    #[must_use]
    pub fn relative_value(&self) -> String {
        if self.kind == SelectorKind::XPath && self.value.starts_with('/') {
            format!(".{}", self.value)
        } else {
            self.value.clone()
        }
    }

    /// Keep only candidates accepted by the filter
    pub(crate) fn apply_filter(
        &self,
        backend: &dyn Backend,
        candidates: Vec<ElementHandle>,
    ) -> FathomResult<Vec<ElementHandle>> {
        let Some(filter) = &self.filter else {
            return Ok(candidates);
        };
        let mut kept = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if filter(backend, &candidate)? {
                kept.push(candidate);
            }
        }
        Ok(kept)
    }
}

impl fmt::Debug for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Locator")
            .field("kind", &self.kind)
            .field("value", &self.value)
            .field("unique", &self.unique)
            .field("filtered", &self.filter.is_some())
            .finish()
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "By.{}({})", self.kind, self.value)?;
        if self.filter.is_some() {
            f.write_str(" filtered")?;
        }
        Ok(())
    }
}

impl PartialEq for Locator {
    fn eq(&self, other: &Self) -> bool {
        let same_filter = match (&self.filter, &other.filter) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        self.kind == other.kind
            && self.value == other.value
            && self.unique == other.unique
            && same_filter
    }
}

impl From<&str> for Locator {
    fn from(selector: &str) -> Self {
        Self::css(selector)
    }
}

impl From<String> for Locator {
    fn from(selector: String) -> Self {
        Self::css(selector)
    }
}

impl From<XPath> for Locator {
    fn from(xpath: XPath) -> Self {
        Self::xpath(xpath.to_string())
    }
}

impl From<&XPath> for Locator {
    fn from(xpath: &XPath) -> Self {
        Self::xpath(xpath.to_string())
    }
}
