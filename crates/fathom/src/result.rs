//! Result and error types for Fathom.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type for Fathom operations
pub type FathomResult<T> = Result<T, FathomError>;

/// Errors that can occur in Fathom
#[derive(Debug, Error)]
pub enum FathomError {
    /// Resolution yielded fewer candidates than the requested index needs
    #[error("Not found")]
    NotFound {
        /// Display form of the locator that was resolved
        locator: String,
        /// Requested index
        index: isize,
    },

    /// A unique locator matched zero or several candidates
    #[error("Not unique ({count} candidates)")]
    NotUnique {
        /// Display form of the locator that was resolved
        locator: String,
        /// Number of candidates found
        count: usize,
    },

    /// Every attempt of a retried action or assertion failed
    #[error("{0}")]
    RetryExhausted(Box<Exhausted>),

    /// A backend primitive failed
    #[error("{operation} failed: {message}")]
    Backend {
        /// Primitive name
        operation: String,
        /// Error message
        message: String,
    },

    /// A single assertion attempt did not hold
    #[error("{message}")]
    AssertionFailed {
        /// Expectation text
        message: String,
    },

    /// Invalid configuration value
    #[error("Invalid configuration for {key}: {message}")]
    Config {
        /// Setting name
        key: String,
        /// Error message
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid regular expression
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl FathomError {
    /// Create a backend failure
    pub fn backend(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create an assertion failure
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            key: key.into(),
            message: message.into(),
        }
    }

    /// The innermost error, looking through nested retry exhaustion
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::RetryExhausted(exhausted) => exhausted.cause.root_cause(),
            other => other,
        }
    }

    /// Whether the root cause is a failed lookup
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self.root_cause(), Self::NotFound { .. })
    }

    /// Whether the root cause is a uniqueness violation
    #[must_use]
    pub fn is_not_unique(&self) -> bool {
        matches!(self.root_cause(), Self::NotUnique { .. })
    }

    /// Total attempts made, if this error came out of a retry sequence
    #[must_use]
    pub fn attempts(&self) -> Option<usize> {
        match self {
            Self::RetryExhausted(exhausted) => Some(exhausted.attempts()),
            _ => None,
        }
    }

    /// Exhaustion details, if any
    #[must_use]
    pub fn exhausted(&self) -> Option<&Exhausted> {
        match self {
            Self::RetryExhausted(exhausted) => Some(exhausted),
            _ => None,
        }
    }

    /// Prefix the diagnostic trail of an exhausted error with `subject`.
    ///
    /// Other errors are returned unchanged.
    #[must_use]
    pub fn with_subject(self, subject: Vec<String>) -> Self {
        match self {
            Self::RetryExhausted(mut exhausted) => {
                let mut trail = subject;
                trail.append(&mut exhausted.subject);
                exhausted.subject = trail;
                Self::RetryExhausted(exhausted)
            }
            other => other,
        }
    }
}

/// Details of a retry sequence that ran out of attempts
#[derive(Debug)]
pub struct Exhausted {
    /// Diagnostic trail, outermost subject first
    pub subject: Vec<String>,
    /// Error raised by the last attempt
    pub cause: FathomError,
    /// Configured retry count (attempts minus one)
    pub retries: usize,
    /// Wall-clock time from the first attempt to the final failure
    pub elapsed: Duration,
}

impl Exhausted {
    /// Create exhaustion details without a subject trail
    #[must_use]
    pub fn new(cause: FathomError, retries: usize, elapsed: Duration) -> Self {
        Self {
            subject: Vec::new(),
            cause,
            retries,
            elapsed,
        }
    }

    /// Number of times the action ran
    #[must_use]
    pub const fn attempts(&self) -> usize {
        self.retries + 1
    }

    /// Joined subject trail
    #[must_use]
    pub fn subject_path(&self) -> String {
        self.subject.join(" > ")
    }

    /// Subject trail including the trails of nested exhaustions, outermost first
    #[must_use]
    pub fn trail(&self) -> Vec<&str> {
        let mut trail: Vec<&str> = self.subject.iter().map(String::as_str).collect();
        let mut cause = &self.cause;
        while let FathomError::RetryExhausted(inner) = cause {
            trail.extend(inner.subject.iter().map(String::as_str));
            cause = &inner.cause;
        }
        trail
    }
}

impl fmt::Display for Exhausted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let trail = self.trail();
        if !trail.is_empty() {
            write!(f, "{}: ", trail.join(" > "))?;
        }
        write!(
            f,
            "{} after {} retries ({:.2}s)",
            self.cause.root_cause(),
            self.retries,
            self.elapsed.as_secs_f64()
        )
    }
}

impl From<Exhausted> for FathomError {
    fn from(exhausted: Exhausted) -> Self {
        Self::RetryExhausted(Box::new(exhausted))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn not_found() -> FathomError {
        FathomError::NotFound {
            locator: "By.id(missing)".to_string(),
            index: 0,
        }
    }

    mod display {
        use super::*;

        #[test]
        fn test_not_found_message() {
            assert_eq!(not_found().to_string(), "Not found");
        }

        #[test]
        fn test_not_unique_message() {
            let err = FathomError::NotUnique {
                locator: "By.tag name(p)".to_string(),
                count: 3,
            };
            assert_eq!(err.to_string(), "Not unique (3 candidates)");
        }

        #[test]
        fn test_backend_message() {
            let err = FathomError::backend("click", "element is stale");
            assert_eq!(err.to_string(), "click failed: element is stale");
        }

        #[test]
        fn test_exhausted_without_subject() {
            let err: FathomError =
                Exhausted::new(not_found(), 0, Duration::from_millis(10)).into();
            assert_eq!(err.to_string(), "Not found after 0 retries (0.01s)");
        }

        #[test]
        fn test_exhausted_with_subject() {
            let err: FathomError =
                Exhausted::new(not_found(), 2, Duration::from_millis(600)).into();
            let err = err.with_subject(vec!["Page".to_string(), "Button".to_string()]);
            assert_eq!(
                err.to_string(),
                "Page > Button: Not found after 2 retries (0.60s)"
            );
        }

        #[test]
        fn test_nested_exhaustion_keeps_inner_trail() {
            let inner: FathomError =
                Exhausted::new(not_found(), 1, Duration::ZERO).into();
            let inner = inner.with_subject(vec!["Form".to_string(), "Button".to_string()]);
            let outer: FathomError = Exhausted::new(inner, 4, Duration::from_millis(1500)).into();
            assert_eq!(
                outer.to_string(),
                "Form > Button: Not found after 4 retries (1.50s)"
            );

            let outer = outer.with_subject(vec!["Page".to_string()]);
            assert_eq!(
                outer.exhausted().unwrap().trail(),
                vec!["Page", "Form", "Button"]
            );
            assert!(outer.to_string().starts_with("Page > Form > Button: Not found"));
        }

        #[test]
        fn test_nested_exhaustion_reports_innermost_cause() {
            let inner: FathomError = Exhausted::new(
                FathomError::assertion("nested"),
                3,
                Duration::from_millis(100),
            )
            .into();
            let outer: FathomError = Exhausted::new(inner, 99, Duration::from_secs(2)).into();
            assert_eq!(outer.to_string(), "nested after 99 retries (2.00s)");
        }
    }

    mod classification {
        use super::*;

        #[test]
        fn test_is_not_found_through_exhaustion() {
            let err: FathomError = Exhausted::new(not_found(), 1, Duration::ZERO).into();
            assert!(err.is_not_found());
            assert!(!err.is_not_unique());
            assert_eq!(err.attempts(), Some(2));
        }

        #[test]
        fn test_plain_error_has_no_attempts() {
            assert_eq!(not_found().attempts(), None);
            assert!(not_found().exhausted().is_none());
        }

        #[test]
        fn test_with_subject_leaves_plain_errors() {
            let err = not_found().with_subject(vec!["x".to_string()]);
            assert_eq!(err.to_string(), "Not found");
        }

        #[test]
        fn test_with_subject_prepends() {
            let err: FathomError = Exhausted {
                subject: vec!["inner".to_string()],
                cause: not_found(),
                retries: 0,
                elapsed: Duration::ZERO,
            }
            .into();
            let err = err.with_subject(vec!["outer".to_string()]);
            assert_eq!(err.exhausted().unwrap().subject_path(), "outer > inner");
        }

        #[test]
        fn test_io_conversion() {
            let err: FathomError =
                std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
            assert!(err.to_string().contains("gone"));
        }
    }
}
