//! Assertions rooted at a [`UiElement`].

use super::node::{AssertionNode, Property};
use super::{Assert, AssertKind, BinaryAssertion, QuantityAssertion, RectAssertion, StringAssertion};
use crate::element::UiElement;
use crate::result::FathomResult;

/// Entry point for assertions on an element, returned by
/// [`UiElement::expect`] and [`UiElement::wait_for`]
#[derive(Debug, Clone)]
pub struct ElementAssertion {
    element: UiElement,
    raise: bool,
}

impl ElementAssertion {
    pub(crate) const fn new(element: UiElement, raise: bool) -> Self {
        Self { element, raise }
    }

    fn property<K: AssertKind>(&self, property: Property) -> Assert<K> {
        Assert::from_node(AssertionNode::element(
            self.element.clone(),
            property,
            self.raise,
        ))
    }

    /// Rendered text
    #[must_use]
    pub fn text(&self) -> StringAssertion {
        self.property(Property::Text)
    }

    /// Tag name
    #[must_use]
    pub fn tag_name(&self) -> StringAssertion {
        self.property(Property::TagName)
    }

    /// Current `value` of an input
    #[must_use]
    pub fn value(&self) -> StringAssertion {
        self.property(Property::Value)
    }

    /// Attribute value; absent attributes read as null
    #[must_use]
    pub fn attribute(&self, name: impl Into<String>) -> StringAssertion {
        self.property(Property::Attribute(name.into()))
    }

    /// Computed CSS property
    #[must_use]
    pub fn css(&self, name: impl Into<String>) -> StringAssertion {
        self.property(Property::Css(name.into()))
    }

    /// Whether the `class` attribute contains all of `classes`
    #[must_use]
    pub fn classes<S: AsRef<str>>(&self, classes: &[S]) -> BinaryAssertion {
        self.attribute("class").has_words(classes)
    }

    /// Number of matches of the element's locator under its parent
    #[must_use]
    pub fn count(&self) -> QuantityAssertion {
        self.property(Property::Count)
    }

    /// Bounding rectangle
    #[must_use]
    pub fn bounds(&self) -> RectAssertion {
        self.property(Property::Bounds)
    }

    /// Expect the displayed state
    ///
    /// # Errors
    ///
    /// When raising, returns the exhausted retry error
    pub fn displayed(&self, expected: bool) -> FathomResult<bool> {
        self.property::<super::Binary>(Property::Displayed).be(expected)
    }

    /// Expect the enabled state
    ///
    /// # Errors
    ///
    /// When raising, returns the exhausted retry error
    pub fn enabled(&self, expected: bool) -> FathomResult<bool> {
        self.property::<super::Binary>(Property::Enabled).be(expected)
    }

    /// Expect the selected state
    ///
    /// # Errors
    ///
    /// When raising, returns the exhausted retry error
    pub fn selected(&self, expected: bool) -> FathomResult<bool> {
        self.property::<super::Binary>(Property::Selected).be(expected)
    }

    /// Expect the element to overlap the viewport, or not
    ///
    /// # Errors
    ///
    /// When raising, returns the exhausted retry error
    pub fn visible(&self, expected: bool) -> FathomResult<bool> {
        self.property::<super::Binary>(Property::Visible).be(expected)
    }

    /// Expect the element to lie entirely within the viewport, or not
    ///
    /// # Errors
    ///
    /// When raising, returns the exhausted retry error
    pub fn fully_visible(&self, expected: bool) -> FathomResult<bool> {
        self.property::<super::Binary>(Property::FullyVisible).be(expected)
    }
}
