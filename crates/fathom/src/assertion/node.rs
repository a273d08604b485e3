//! Lazy property chains behind every assertion.
//!
//! An [`AssertionNode`] knows how to produce its current value and how to
//! describe itself, but holds no value. Roots read an element property or
//! call a supplier; derived nodes transform their parent's value. Every
//! observation walks the chain from the root again.

use regex::Regex;
use std::fmt;
use std::sync::Arc;

use super::value::{Format, Value};
use crate::element::UiElement;
use crate::geometry::Rect;
use crate::listener::Listener;
use crate::result::FathomResult;
use crate::script;

/// Produces the current value of a supplied assertion root
pub(crate) type Supplier = Arc<dyn Fn() -> FathomResult<Value> + Send + Sync>;

/// Transforms a parent value into a derived one
pub(crate) type Transform = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Element property read by an element-backed root
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Property {
    Text,
    TagName,
    Value,
    Attribute(String),
    Css(String),
    Displayed,
    Enabled,
    Selected,
    Visible,
    FullyVisible,
    Count,
    Bounds,
}

impl Property {
    fn label(&self) -> String {
        match self {
            Self::Text => ".text".to_string(),
            Self::TagName => ".tag_name".to_string(),
            Self::Value => ".value".to_string(),
            Self::Attribute(name) => format!(".attribute({name})"),
            Self::Css(name) => format!(".css({name})"),
            Self::Displayed => ".displayed".to_string(),
            Self::Enabled => ".enabled".to_string(),
            Self::Selected => ".selected".to_string(),
            Self::Visible => ".visible".to_string(),
            Self::FullyVisible => ".fully_visible".to_string(),
            Self::Count => ".count".to_string(),
            Self::Bounds => ".bounds".to_string(),
        }
    }

    fn read(&self, element: &UiElement) -> FathomResult<Value> {
        let backend = element.session().backend();
        let handle = || element.resolve();
        let value: Value = match self {
            Self::Text => backend.text(&handle()?)?.into(),
            Self::TagName => backend.tag_name(&handle()?)?.into(),
            Self::Value => backend.attribute(&handle()?, "value")?.into(),
            Self::Attribute(name) => backend.attribute(&handle()?, name)?.into(),
            Self::Css(name) => backend.css_property(&handle()?, name)?.into(),
            Self::Displayed => backend.is_displayed(&handle()?)?.into(),
            Self::Enabled => backend.is_enabled(&handle()?)?.into(),
            Self::Selected => backend.is_selected(&handle()?)?.into(),
            Self::Visible => {
                let bounds = backend.bounding_rect(&handle()?)?;
                script::viewport(backend)?.intersects(&bounds).into()
            }
            Self::FullyVisible => {
                let bounds = backend.bounding_rect(&handle()?)?;
                script::viewport(backend)?.contains(&bounds).into()
            }
            Self::Count => element.resolve_all()?.len().into(),
            Self::Bounds => backend.bounding_rect(&handle()?)?.into(),
        };
        Ok(value)
    }
}

/// Ordering comparison against a fixed operand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Comparison {
    Greater,
    GreaterEqual,
    Lower,
    LowerEqual,
}

impl Comparison {
    const fn label(self) -> &'static str {
        match self {
            Self::Greater => "greater than",
            Self::GreaterEqual => "greater equal than",
            Self::Lower => "lower than",
            Self::LowerEqual => "lower equal than",
        }
    }

    fn holds(self, actual: &Value, operand: &Value) -> bool {
        actual.compare(operand).is_some_and(|ordering| match self {
            Self::Greater => ordering.is_gt(),
            Self::GreaterEqual => ordering.is_ge(),
            Self::Lower => ordering.is_lt(),
            Self::LowerEqual => ordering.is_le(),
        })
    }
}

/// Edge or extent of a rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Edge {
    Left,
    Top,
    Width,
    Height,
    Right,
    Bottom,
}

impl Edge {
    const fn label(self) -> &'static str {
        match self {
            Self::Left => ".left",
            Self::Top => ".top",
            Self::Width => ".width",
            Self::Height => ".height",
            Self::Right => ".right",
            Self::Bottom => ".bottom",
        }
    }

    fn of(self, rect: &Rect) -> f64 {
        match self {
            Self::Left => rect.left,
            Self::Top => rect.top,
            Self::Width => rect.width,
            Self::Height => rect.height,
            Self::Right => rect.right(),
            Self::Bottom => rect.bottom(),
        }
    }
}

/// How a derived node computes its value from its parent's
#[derive(Clone)]
pub(crate) enum Derivation {
    Length,
    Compare(Comparison, Value),
    Between(Value, Value),
    StartsWith(String),
    EndsWith(String),
    Contains(String),
    Matches(Regex),
    HasWords(Vec<String>),
    Edge(Edge),
    RectContains(Rect),
    RectIntersects(Rect),
    Mapped { name: String, transform: Transform },
}

impl Derivation {
    fn apply(&self, value: &Value) -> Value {
        let text = value.as_text();
        match self {
            Self::Length => text.map_or(Value::Null, |s| s.chars().count().into()),
            Self::Compare(comparison, operand) => comparison.holds(value, operand).into(),
            Self::Between(lower, upper) => (Comparison::GreaterEqual.holds(value, lower)
                && Comparison::LowerEqual.holds(value, upper))
            .into(),
            Self::StartsWith(prefix) => text.is_some_and(|s| s.starts_with(prefix.as_str())).into(),
            Self::EndsWith(suffix) => text.is_some_and(|s| s.ends_with(suffix.as_str())).into(),
            Self::Contains(part) => text.is_some_and(|s| s.contains(part.as_str())).into(),
            Self::Matches(regex) => text
                .and_then(|s| regex.find(s))
                .is_some_and(|m| m.start() == 0)
                .into(),
            Self::HasWords(words) => text
                .is_some_and(|s| {
                    let present: Vec<&str> = s.split_whitespace().collect();
                    words.iter().all(|w| present.contains(&w.as_str()))
                })
                .into(),
            Self::Edge(edge) => value
                .as_rect()
                .map_or(Value::Null, |rect| edge.of(&rect).into()),
            Self::RectContains(other) => value.as_rect().is_some_and(|r| r.contains(other)).into(),
            Self::RectIntersects(other) => {
                value.as_rect().is_some_and(|r| r.intersects(other)).into()
            }
            Self::Mapped { transform, .. } => transform(value),
        }
    }

    /// Subject fragment; `actual` is the derived value when observed
    fn fragment(&self, actual: Option<&Value>) -> String {
        let with_actual = |label: &str| match actual {
            Some(value) => format!("{label} {}", Format::param(value)),
            None => label.to_string(),
        };
        match self {
            Self::Length => with_actual("length"),
            Self::Compare(comparison, operand) => {
                format!("{} {}", comparison.label(), Format::param(operand))
            }
            Self::Between(lower, upper) => format!(
                "between {} and {}",
                Format::param(lower),
                Format::param(upper)
            ),
            Self::StartsWith(prefix) => format!("starts with [{prefix}]"),
            Self::EndsWith(suffix) => format!("ends with [{suffix}]"),
            Self::Contains(part) => format!("contains [{part}]"),
            Self::Matches(regex) => format!("matches [{}]", regex.as_str()),
            Self::HasWords(words) => format!("has words {}", Format::list(words)),
            Self::Edge(edge) => with_actual(edge.label()),
            Self::RectContains(rect) => format!("contains [{rect}]"),
            Self::RectIntersects(rect) => format!("intersects [{rect}]"),
            Self::Mapped { name, .. } => with_actual(name),
        }
    }
}

impl fmt::Debug for Derivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fragment(None))
    }
}

#[derive(Clone)]
enum Source {
    Element {
        element: UiElement,
        property: Property,
    },
    Supplied {
        name: String,
        supplier: Supplier,
        listener: Option<Arc<dyn Listener>>,
    },
    Derived {
        parent: Arc<AssertionNode>,
        derivation: Derivation,
    },
}

/// A value read once together with the subject describing it
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Observation {
    pub value: Value,
    pub subject: Vec<String>,
}

/// One link of an assertion chain
#[derive(Clone)]
pub(crate) struct AssertionNode {
    source: Source,
    raise: bool,
}

impl AssertionNode {
    pub(crate) fn element(element: UiElement, property: Property, raise: bool) -> Arc<Self> {
        Arc::new(Self {
            source: Source::Element { element, property },
            raise,
        })
    }

    pub(crate) fn supplied(
        name: String,
        supplier: Supplier,
        raise: bool,
        listener: Option<Arc<dyn Listener>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            source: Source::Supplied {
                name,
                supplier,
                listener,
            },
            raise,
        })
    }

    /// Derived node inheriting the parent's raise flag
    pub(crate) fn derive(parent: &Arc<Self>, derivation: Derivation) -> Arc<Self> {
        Arc::new(Self {
            raise: parent.raise,
            source: Source::Derived {
                parent: Arc::clone(parent),
                derivation,
            },
        })
    }

    pub(crate) fn with_raise(&self, raise: bool) -> Arc<Self> {
        Arc::new(Self {
            source: self.source.clone(),
            raise,
        })
    }

    pub(crate) const fn raise(&self) -> bool {
        self.raise
    }

    /// Read the current value, walking the chain from its root
    pub(crate) fn observe(&self) -> FathomResult<Observation> {
        match &self.source {
            Source::Element { element, property } => {
                let value = property.read(element)?;
                let subject = vec![format!(
                    "{}{} {}",
                    element.name_path(),
                    property.label(),
                    Format::param(&value)
                )];
                Ok(Observation { value, subject })
            }
            Source::Supplied { name, supplier, .. } => {
                let value = supplier()?;
                let subject = vec![format!("{name} {}", Format::param(&value))];
                Ok(Observation { value, subject })
            }
            Source::Derived { parent, derivation } => {
                let Observation { value, mut subject } = parent.observe()?;
                let derived = derivation.apply(&value);
                subject.push(derivation.fragment(Some(&derived)));
                Ok(Observation {
                    value: derived,
                    subject,
                })
            }
        }
    }

    /// Subject fragments without observed values
    pub(crate) fn describe(&self) -> Vec<String> {
        match &self.source {
            Source::Element { element, property } => {
                vec![format!("{}{}", element.name_path(), property.label())]
            }
            Source::Supplied { name, .. } => vec![name.clone()],
            Source::Derived { parent, derivation } => {
                let mut subject = parent.describe();
                subject.push(derivation.fragment(None));
                subject
            }
        }
    }

    /// Element at the root of the chain, if element-backed
    pub(crate) fn element_root(&self) -> Option<&UiElement> {
        match &self.source {
            Source::Element { element, .. } => Some(element),
            Source::Supplied { .. } => None,
            Source::Derived { parent, .. } => parent.element_root(),
        }
    }

    /// Hooks to notify: the element's session listener or the supplier's
    pub(crate) fn listener(&self) -> Option<Arc<dyn Listener>> {
        match &self.source {
            Source::Element { element, .. } => Some(Arc::clone(element.session().listener())),
            Source::Supplied { listener, .. } => listener.clone(),
            Source::Derived { parent, .. } => parent.listener(),
        }
    }
}

impl fmt::Debug for AssertionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssertionNode")
            .field("subject", &self.describe().join(" "))
            .field("raise", &self.raise)
            .finish()
    }
}
