//! Dynamically typed values observed by assertions.

use std::cmp::Ordering;
use std::fmt;

use crate::geometry::Rect;

/// A value read from the document or produced by a supplier
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absent value, e.g. a missing attribute
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// Text
    Text(String),
    /// Rectangle
    Rect(Rect),
}

impl Value {
    /// Whether the value is absent
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Boolean content
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric content as a float
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Text content
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Rectangle content
    #[must_use]
    pub const fn as_rect(&self) -> Option<Rect> {
        match self {
            Self::Rect(r) => Some(*r),
            _ => None,
        }
    }

    /// Order two values of compatible kinds.
    ///
    /// Integers and floats compare numerically with each other; text
    /// compares lexicographically. Anything else is unordered.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            _ => self.as_f64()?.partial_cmp(&other.as_f64()?),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Rect(a), Self::Rect(b)) => a == b,
            _ => matches!(self.compare(other), Some(Ordering::Equal)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
            Self::Rect(r) => write!(f, "{r}"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::Float(f64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<Option<String>> for Value {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::Null, Self::Text)
    }
}

impl From<Option<&str>> for Value {
    fn from(value: Option<&str>) -> Self {
        value.map_or(Self::Null, Self::from)
    }
}

impl From<Rect> for Value {
    fn from(value: Rect) -> Self {
        Self::Rect(value)
    }
}

/// Formatting helpers for assertion messages
#[derive(Debug, Clone, Copy)]
pub struct Format;

impl Format {
    /// Bracketed parameter: `[value]`, or `[null]` when absent
    #[must_use]
    pub fn param(value: &Value) -> String {
        format!("[{value}]")
    }

    /// Bracketed, comma separated list
    #[must_use]
    pub fn list<S: AsRef<str>>(items: &[S]) -> String {
        let items: Vec<&str> = items.iter().map(AsRef::as_ref).collect();
        format!("[{}]", items.join(", "))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod equality {
        use super::*;

        #[test]
        fn test_numbers_compare_across_kinds() {
            assert_eq!(Value::from(3), Value::from(3.0));
            assert_ne!(Value::from(3), Value::from(3.5));
        }

        #[test]
        fn test_kinds_do_not_mix() {
            assert_ne!(Value::from("1"), Value::from(1));
            assert_ne!(Value::Null, Value::from(""));
            assert_ne!(Value::from(true), Value::from(1));
        }

        #[test]
        fn test_option_conversion() {
            assert!(Value::from(None::<String>).is_null());
            assert_eq!(Value::from(Some("x")), Value::from("x"));
        }
    }

    mod ordering {
        use super::*;

        #[test]
        fn test_numeric_ordering() {
            assert_eq!(Value::from(2).compare(&Value::from(2.5)), Some(Ordering::Less));
            assert_eq!(Value::from(10usize).compare(&Value::from(9)), Some(Ordering::Greater));
        }

        #[test]
        fn test_text_ordering() {
            assert_eq!(Value::from("b").compare(&Value::from("a")), Some(Ordering::Greater));
        }

        #[test]
        fn test_unordered_kinds() {
            assert_eq!(Value::from("1").compare(&Value::from(1)), None);
            assert_eq!(Value::Null.compare(&Value::Null), None);
            assert_eq!(Value::from(f64::NAN).compare(&Value::from(1.0)), None);
        }
    }

    mod formatting {
        use super::*;

        #[test]
        fn test_param() {
            assert_eq!(Format::param(&Value::Null), "[null]");
            assert_eq!(Format::param(&Value::from("Save")), "[Save]");
            assert_eq!(Format::param(&Value::from(2.5)), "[2.5]");
        }

        #[test]
        fn test_list() {
            assert_eq!(Format::list(&["a", "b"]), "[a, b]");
        }

        #[test]
        fn test_rect_display() {
            let value = Value::from(Rect::new(0.0, 0.0, 10.0, 5.0));
            assert_eq!(value.as_rect(), Some(Rect::new(0.0, 0.0, 10.0, 5.0)));
        }
    }
}
