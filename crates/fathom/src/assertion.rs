//! Retrying, fluent assertions.
//!
//! An assertion is a lazy chain: a root that reads an element property or
//! calls a supplier, followed by any number of derivations. Nothing is read
//! until a terminal comparison such as [`Assert::be`] runs; it then
//! re-observes the whole chain on every attempt of the active retry
//! [`Sequence`].
//!
//! The kind parameter decides which derivations are available:
//!
//! | Kind | Alias | Adds |
//! |------|-------|------|
//! | [`Binary`] | [`BinaryAssertion`] | `be`, `not_be` |
//! | [`Quantity`] | [`QuantityAssertion`] | ordering, `between` |
//! | [`Text`] | [`StringAssertion`] | ordering, substring, regex, words, `length` |
//! | [`Bounds`] | [`RectAssertion`] | edges, `contains`, `intersects` |
//!
//! Assertions created through `expect` raise on failure; those created
//! through `wait_for` return `Ok(false)`. Derived assertions inherit the
//! flag of the assertion they were derived from.
//!
//! ```
//! use std::sync::Arc;
//! use fathom::mock::MockBackend;
//! use fathom::retry::{self, Overrides};
//! use fathom::{Session, StringAssertion};
//!
//! let session = Session::new(Arc::new(MockBackend::new()));
//! let greeting: StringAssertion = session.expect_that("greeting", || Ok("Hello"));
//! let passed = retry::with_config(Overrides::new().retry_count(0), || {
//!     greeting.length().greater_than(3).be(true)
//! });
//! assert!(passed.unwrap());
//! ```

mod element;
mod node;
mod value;

pub use element::ElementAssertion;
pub use value::{Format, Value};

pub(crate) use node::AssertionNode;

use regex::RegexBuilder;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

use crate::geometry::Rect;
use crate::listener::{notify, AssertionInfo};
use crate::result::{FathomError, FathomResult};
use crate::retry::Sequence;
use node::{Comparison, Derivation, Edge};

mod sealed {
    pub trait Sealed {}
}

/// Marker for the kind of value an assertion holds
pub trait AssertKind: sealed::Sealed + Send + Sync + 'static {}

/// Marker for kinds with an ordering
pub trait Ordered: AssertKind {}

/// Any value; equality only
#[derive(Debug, Clone, Copy)]
pub enum Binary {}

/// Numbers
#[derive(Debug, Clone, Copy)]
pub enum Quantity {}

/// Strings
#[derive(Debug, Clone, Copy)]
pub enum Text {}

/// Rectangles
#[derive(Debug, Clone, Copy)]
pub enum Bounds {}

impl sealed::Sealed for Binary {}
impl sealed::Sealed for Quantity {}
impl sealed::Sealed for Text {}
impl sealed::Sealed for Bounds {}
impl AssertKind for Binary {}
impl AssertKind for Quantity {}
impl AssertKind for Text {}
impl AssertKind for Bounds {}
impl Ordered for Quantity {}
impl Ordered for Text {}

/// Equality assertion
pub type BinaryAssertion = Assert<Binary>;
/// Numeric assertion
pub type QuantityAssertion = Assert<Quantity>;
/// String assertion
pub type StringAssertion = Assert<Text>;
/// Rectangle assertion
pub type RectAssertion = Assert<Bounds>;

/// A lazily evaluated assertion of kind `K`
pub struct Assert<K> {
    node: Arc<AssertionNode>,
    _kind: PhantomData<fn() -> K>,
}

impl<K> Clone for Assert<K> {
    fn clone(&self) -> Self {
        Self {
            node: Arc::clone(&self.node),
            _kind: PhantomData,
        }
    }
}

impl<K> fmt::Debug for Assert<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Assert")
            .field("subject", &self.node.describe().join(" "))
            .field("raise", &self.node.raise())
            .finish()
    }
}

impl<K: AssertKind> Assert<K> {
    pub(crate) fn from_node(node: Arc<AssertionNode>) -> Self {
        Self {
            node,
            _kind: PhantomData,
        }
    }

    fn derive<M: AssertKind>(&self, derivation: Derivation) -> Assert<M> {
        Assert::from_node(AssertionNode::derive(&self.node, derivation))
    }

    /// Subject path without observed values
    #[must_use]
    pub fn subject(&self) -> String {
        self.node.describe().join(" ")
    }

    /// Whether failures raise (`expect`) or return `Ok(false)` (`wait_for`)
    #[must_use]
    pub fn is_raising(&self) -> bool {
        self.node.raise()
    }

    /// Copy of this assertion with the raise flag replaced
    #[must_use]
    pub fn raising(&self, raise: bool) -> Self {
        Self::from_node(self.node.with_raise(raise))
    }

    /// Read the current value once, without retrying
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be read
    pub fn actual(&self) -> FathomResult<Value> {
        Ok(self.node.observe()?.value)
    }

    /// Expect the value to equal `expected`
    ///
    /// # Errors
    ///
    /// When raising, returns [`FathomError::RetryExhausted`] once every
    /// attempt failed
    pub fn be(&self, expected: impl Into<Value>) -> FathomResult<bool> {
        let expected = expected.into();
        let expectation = format!("to be {}", Format::param(&expected));
        self.test(&expectation, |actual| actual == &expected)
    }

    /// Expect the value to differ from `unexpected`
    ///
    /// # Errors
    ///
    /// When raising, returns [`FathomError::RetryExhausted`] once every
    /// attempt failed
    pub fn not_be(&self, unexpected: impl Into<Value>) -> FathomResult<bool> {
        let unexpected = unexpected.into();
        let expectation = format!("not to be {}", Format::param(&unexpected));
        self.test(&expectation, |actual| actual != &unexpected)
    }

    /// Derived assertion of the same kind over a transformed value
    #[must_use]
    pub fn map<F>(&self, name: impl Into<String>, transform: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.map_as(name, transform)
    }

    /// Derived assertion of another kind over a transformed value
    #[must_use]
    pub fn map_as<M, F>(&self, name: impl Into<String>, transform: F) -> Assert<M>
    where
        M: AssertKind,
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.derive(Derivation::Mapped {
            name: name.into(),
            transform: Arc::new(transform),
        })
    }

    fn test<P>(&self, expectation: &str, predicate: P) -> FathomResult<bool>
    where
        P: Fn(&Value) -> bool,
    {
        let node = &self.node;
        let listener = node.listener();
        let element = node.element_root();
        let info = AssertionInfo::new(node.describe().join(" "), expectation);

        let outcome = Sequence::current().run(
            || {
                let observation = node.observe()?;
                if predicate(&observation.value) {
                    Ok(())
                } else {
                    Err(FathomError::assertion(format!(
                        "Expected {} {expectation}",
                        observation.subject.join(" ")
                    )))
                }
            },
            |err, _| {
                if let Some(listener) = &listener {
                    notify("assertion_failed", || {
                        listener.assertion_failed(&info, element, err)
                    });
                }
            },
        );

        match outcome {
            Ok(()) => {
                if let Some(listener) = &listener {
                    notify("assertion_passed", || listener.assertion_passed(&info, element));
                }
                Ok(true)
            }
            Err(err) => {
                if let Some(listener) = &listener {
                    notify("assertion_failed_finally", || {
                        listener.assertion_failed_finally(&info, element, &err)
                    });
                }
                if !node.raise() {
                    debug!("{info} did not hold: {err}");
                    return Ok(false);
                }
                if matches!(err.root_cause(), FathomError::AssertionFailed { .. }) {
                    Err(err)
                } else {
                    Err(err.with_subject(vec![format!("Expected {info}")]))
                }
            }
        }
    }
}

impl<K: Ordered> Assert<K> {
    fn compare(&self, comparison: Comparison, operand: impl Into<Value>) -> BinaryAssertion {
        self.derive(Derivation::Compare(comparison, operand.into()))
    }

    /// Whether the value is greater than `expected`
    #[must_use]
    pub fn greater_than(&self, expected: impl Into<Value>) -> BinaryAssertion {
        self.compare(Comparison::Greater, expected)
    }

    /// Whether the value is greater than or equal to `expected`
    #[must_use]
    pub fn greater_equal_than(&self, expected: impl Into<Value>) -> BinaryAssertion {
        self.compare(Comparison::GreaterEqual, expected)
    }

    /// Whether the value is lower than `expected`
    #[must_use]
    pub fn lower_than(&self, expected: impl Into<Value>) -> BinaryAssertion {
        self.compare(Comparison::Lower, expected)
    }

    /// Whether the value is lower than or equal to `expected`
    #[must_use]
    pub fn lower_equal_than(&self, expected: impl Into<Value>) -> BinaryAssertion {
        self.compare(Comparison::LowerEqual, expected)
    }

    /// Whether the value lies within `lower..=upper`
    #[must_use]
    pub fn between(&self, lower: impl Into<Value>, upper: impl Into<Value>) -> BinaryAssertion {
        self.derive(Derivation::Between(lower.into(), upper.into()))
    }
}

impl Assert<Text> {
    /// Whether the text starts with `prefix`
    #[must_use]
    pub fn starts_with(&self, prefix: impl Into<String>) -> BinaryAssertion {
        self.derive(Derivation::StartsWith(prefix.into()))
    }

    /// Whether the text ends with `suffix`
    #[must_use]
    pub fn ends_with(&self, suffix: impl Into<String>) -> BinaryAssertion {
        self.derive(Derivation::EndsWith(suffix.into()))
    }

    /// Whether the text contains `part`
    #[must_use]
    pub fn contains(&self, part: impl Into<String>) -> BinaryAssertion {
        self.derive(Derivation::Contains(part.into()))
    }

    /// Whether `pattern` matches at the start of the text.
    ///
    /// Matching ignores case and treats `^`/`$` as line anchors.
    ///
    /// # Errors
    ///
    /// Returns [`FathomError::Regex`] if the pattern does not compile
    pub fn matches(&self, pattern: &str) -> FathomResult<BinaryAssertion> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .multi_line(true)
            .build()?;
        Ok(self.derive(Derivation::Matches(regex)))
    }

    /// Whether every word appears among the whitespace separated words of the text
    #[must_use]
    pub fn has_words<S: AsRef<str>>(&self, words: &[S]) -> BinaryAssertion {
        self.derive(Derivation::HasWords(
            words.iter().map(|w| w.as_ref().to_string()).collect(),
        ))
    }

    /// Length of the text in characters
    #[must_use]
    pub fn length(&self) -> QuantityAssertion {
        self.derive(Derivation::Length)
    }
}

impl Assert<Bounds> {
    fn edge(&self, edge: Edge) -> QuantityAssertion {
        self.derive(Derivation::Edge(edge))
    }

    /// Left edge
    #[must_use]
    pub fn left(&self) -> QuantityAssertion {
        self.edge(Edge::Left)
    }

    /// Top edge
    #[must_use]
    pub fn top(&self) -> QuantityAssertion {
        self.edge(Edge::Top)
    }

    /// Width
    #[must_use]
    pub fn width(&self) -> QuantityAssertion {
        self.edge(Edge::Width)
    }

    /// Height
    #[must_use]
    pub fn height(&self) -> QuantityAssertion {
        self.edge(Edge::Height)
    }

    /// Right edge
    #[must_use]
    pub fn right(&self) -> QuantityAssertion {
        self.edge(Edge::Right)
    }

    /// Bottom edge
    #[must_use]
    pub fn bottom(&self) -> QuantityAssertion {
        self.edge(Edge::Bottom)
    }

    /// Whether the rectangle fully contains `other`
    #[must_use]
    pub fn contains(&self, other: Rect) -> BinaryAssertion {
        self.derive(Derivation::RectContains(other))
    }

    /// Whether the rectangle overlaps `other`
    #[must_use]
    pub fn intersects(&self, other: Rect) -> BinaryAssertion {
        self.derive(Derivation::RectIntersects(other))
    }
}
