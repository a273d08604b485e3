//! Observation hooks around actions and assertions.
//!
//! The engine calls a [`Listener`] after every failed attempt and once with
//! the final outcome. Hooks are side channels: an error or panic inside one
//! is logged and swallowed, never allowed to change the result of the
//! action or assertion that triggered it.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;
use tracing::{debug, warn};

use crate::element::UiElement;
use crate::geometry::Color;
use crate::result::{FathomError, FathomResult};
use crate::script;
use crate::settings::Settings;

/// Name under which [`UiElement::highlight`] reports to listeners
pub const HIGHLIGHT_ACTION: &str = "highlight";

/// Description of an assertion passed to hooks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionInfo {
    /// Subject chain without actual values, e.g. `UiElement(..)[0] .text`
    pub subject: String,
    /// Expected outcome, e.g. `to be [Save]`
    pub expectation: String,
}

impl AssertionInfo {
    /// Create assertion info
    #[must_use]
    pub fn new(subject: impl Into<String>, expectation: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            expectation: expectation.into(),
        }
    }
}

impl fmt::Display for AssertionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.subject, self.expectation)
    }
}

/// Callbacks around actions and assertions. Every method defaults to a no-op.
pub trait Listener: Send + Sync {
    /// An action succeeded
    fn action_passed(&self, _action: &str, _element: &UiElement) -> FathomResult<()> {
        Ok(())
    }

    /// One attempt of an action failed
    fn action_failed(
        &self,
        _action: &str,
        _element: &UiElement,
        _error: &FathomError,
    ) -> FathomResult<()> {
        Ok(())
    }

    /// An action failed on every attempt
    fn action_failed_finally(
        &self,
        _action: &str,
        _element: &UiElement,
        _error: &FathomError,
    ) -> FathomResult<()> {
        Ok(())
    }

    /// An assertion held
    fn assertion_passed(
        &self,
        _assertion: &AssertionInfo,
        _element: Option<&UiElement>,
    ) -> FathomResult<()> {
        Ok(())
    }

    /// One attempt of an assertion failed
    fn assertion_failed(
        &self,
        _assertion: &AssertionInfo,
        _element: Option<&UiElement>,
        _error: &FathomError,
    ) -> FathomResult<()> {
        Ok(())
    }

    /// An assertion failed on every attempt
    fn assertion_failed_finally(
        &self,
        _assertion: &AssertionInfo,
        _element: Option<&UiElement>,
        _error: &FathomError,
    ) -> FathomResult<()> {
        Ok(())
    }
}

/// Listener that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl Listener for NoopListener {}

/// Run a hook, logging and discarding any error or panic
pub(crate) fn notify<F>(hook: &str, call: F)
where
    F: FnOnce() -> FathomResult<()>,
{
    match catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!(hook, "listener failed: {err}"),
        Err(_) => warn!(hook, "listener panicked"),
    }
}

/// Marks elements visually as actions and assertions complete.
///
/// Passing actions are outlined in yellow, passing assertions in green and
/// final failures in red. The highlight action itself is never marked, and
/// nothing is marked when the element could not be found at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightListener {
    /// Outline duration
    pub duration: Duration,
    /// Color for passed actions
    pub action_color: Color,
    /// Color for passed assertions
    pub passed_color: Color,
    /// Color for final failures
    pub failed_color: Color,
}

impl Default for HighlightListener {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(2),
            action_color: Color::YELLOW,
            passed_color: Color::GREEN,
            failed_color: Color::RED,
        }
    }
}

impl HighlightListener {
    /// Create a listener with default colors
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a listener using the configured highlight duration
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self::default().with_duration(settings.highlight_duration)
    }

    /// Set the outline duration
    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    fn mark(&self, element: &UiElement, color: Color) -> FathomResult<()> {
        let handle = element.resolve()?;
        script::highlight(element.session().backend(), &handle, color, self.duration)
    }

    fn mark_failure(&self, element: &UiElement, error: &FathomError) -> FathomResult<()> {
        if error.is_not_found() {
            debug!("Cannot highlight {}: {}", element.name_path(), error.root_cause());
            return Ok(());
        }
        self.mark(element, self.failed_color)
    }
}

impl Listener for HighlightListener {
    fn action_passed(&self, action: &str, element: &UiElement) -> FathomResult<()> {
        if action == HIGHLIGHT_ACTION {
            return Ok(());
        }
        self.mark(element, self.action_color)
    }

    fn action_failed_finally(
        &self,
        action: &str,
        element: &UiElement,
        error: &FathomError,
    ) -> FathomResult<()> {
        if action == HIGHLIGHT_ACTION {
            return Ok(());
        }
        self.mark_failure(element, error)
    }

    fn assertion_passed(
        &self,
        _assertion: &AssertionInfo,
        element: Option<&UiElement>,
    ) -> FathomResult<()> {
        match element {
            Some(element) => self.mark(element, self.passed_color),
            None => Ok(()),
        }
    }

    fn assertion_failed_finally(
        &self,
        _assertion: &AssertionInfo,
        element: Option<&UiElement>,
        error: &FathomError,
    ) -> FathomResult<()> {
        match element {
            Some(element) => self.mark_failure(element, error),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::backend::{ScriptArg, SelectorKind};
    use crate::locator::Locator;
    use crate::mock::{MockBackend, MockElement, Scope};
    use crate::retry::{self, RetryConfig};
    use crate::session::Session;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn push(&self, event: String) -> FathomResult<()> {
            self.events.lock().unwrap().push(event);
            Ok(())
        }
    }

    impl Listener for Recorder {
        fn action_passed(&self, action: &str, _element: &UiElement) -> FathomResult<()> {
            self.push(format!("passed:{action}"))
        }

        fn action_failed(
            &self,
            action: &str,
            _element: &UiElement,
            _error: &FathomError,
        ) -> FathomResult<()> {
            self.push(format!("failed:{action}"))
        }

        fn action_failed_finally(
            &self,
            action: &str,
            _element: &UiElement,
            _error: &FathomError,
        ) -> FathomResult<()> {
            self.push(format!("failed_finally:{action}"))
        }
    }

    struct Broken;

    impl Listener for Broken {
        fn action_passed(&self, _action: &str, _element: &UiElement) -> FathomResult<()> {
            Err(FathomError::backend("listener", "broken"))
        }

        #[allow(clippy::panic)]
        fn action_failed_finally(
            &self,
            _action: &str,
            _element: &UiElement,
            _error: &FathomError,
        ) -> FathomResult<()> {
            panic!("listener exploded");
        }
    }

    fn button_backend() -> Arc<MockBackend> {
        let backend = Arc::new(MockBackend::new());
        backend.add_element("btn", MockElement::new("button"));
        backend.respond(Scope::Document, SelectorKind::Id, "btn", &["btn"]);
        backend
    }

    fn session(backend: &Arc<MockBackend>, listener: Arc<dyn Listener>) -> Session {
        Session::builder(backend.clone())
            .settings(Settings::default())
            .listener(listener)
            .build()
    }

    fn outline_colors(backend: &MockBackend) -> Vec<serde_json::Value> {
        backend
            .scripts()
            .into_iter()
            .filter(|(script, _)| script == script::HIGHLIGHT)
            .filter_map(|(_, args)| match args.get(1) {
                Some(ScriptArg::Value(color)) => Some(color.clone()),
                _ => None,
            })
            .collect()
    }

    mod dispatch {
        use super::*;

        #[test]
        fn test_events_per_attempt_and_outcome() {
            let backend = button_backend();
            backend.fail_next("click", 1);
            let recorder = Arc::new(Recorder::default());
            let session = session(&backend, recorder.clone());

            retry::with_config(RetryConfig::new(2, Duration::ZERO), || {
                session.find(Locator::id("btn")).click().map(|_| ())
            })
            .unwrap();
            assert_eq!(recorder.events(), vec!["failed:click", "passed:click"]);
        }

        #[test]
        fn test_final_failure_event() {
            let backend = button_backend();
            let recorder = Arc::new(Recorder::default());
            let session = session(&backend, recorder.clone());

            let result = retry::with_config(RetryConfig::new(1, Duration::ZERO), || {
                session.find(Locator::id("nope")).click().map(|_| ())
            });
            assert!(result.is_err());
            assert_eq!(
                recorder.events(),
                vec!["failed:click", "failed:click", "failed_finally:click"]
            );
        }

        #[test]
        fn test_broken_listener_does_not_mask_result() {
            let backend = button_backend();
            let session = session(&backend, Arc::new(Broken));
            retry::with_config(RetryConfig::once(), || {
                assert!(session.find(Locator::id("btn")).click().is_ok());
                let err = session.find(Locator::id("nope")).click().unwrap_err();
                assert!(err.is_not_found());
            });
        }

        #[test]
        fn test_noop_listener() {
            let backend = button_backend();
            let session = session(&backend, Arc::new(NoopListener));
            let element = session.find(Locator::id("btn"));
            assert!(NoopListener.action_passed("click", &element).is_ok());
        }
    }

    mod highlighting {
        use super::*;

        #[test]
        fn test_action_pass_outlines_yellow() {
            let backend = button_backend();
            let session = session(&backend, Arc::new(HighlightListener::new()));
            retry::with_config(RetryConfig::once(), || {
                session.find(Locator::id("btn")).click().map(|_| ())
            })
            .unwrap();
            assert_eq!(outline_colors(&backend), vec![json!("rgb(255, 255, 0)")]);
        }

        #[test]
        fn test_final_failure_outlines_red() {
            let backend = button_backend();
            backend.fail_next("click", 1);
            let session = session(&backend, Arc::new(HighlightListener::new()));
            let result = retry::with_config(RetryConfig::once(), || {
                session.find(Locator::id("btn")).click().map(|_| ())
            });
            assert!(result.is_err());
            assert_eq!(outline_colors(&backend), vec![json!("rgb(255, 0, 0)")]);
        }

        #[test]
        fn test_not_found_is_not_marked() {
            let backend = button_backend();
            let session = session(&backend, Arc::new(HighlightListener::new()));
            let result = retry::with_config(RetryConfig::once(), || {
                session.find(Locator::id("missing")).click().map(|_| ())
            });
            assert!(result.is_err());
            assert!(outline_colors(&backend).is_empty());
        }

        #[test]
        fn test_highlight_action_not_marked_again() {
            let backend = button_backend();
            let session = session(&backend, Arc::new(HighlightListener::new()));
            retry::with_config(RetryConfig::once(), || {
                session
                    .find(Locator::id("btn"))
                    .highlight(Color::BLUE, Duration::from_millis(10))
                    .map(|_| ())
            })
            .unwrap();
            assert_eq!(outline_colors(&backend), vec![json!("rgb(0, 0, 255)")]);
        }

        #[test]
        fn test_assertion_pass_outlines_green() {
            let backend = button_backend();
            let session = session(&backend, Arc::new(HighlightListener::new()));
            let passed = retry::with_config(RetryConfig::once(), || {
                session.find(Locator::id("btn")).expect().tag_name().be("button")
            })
            .unwrap();
            assert!(passed);
            assert_eq!(outline_colors(&backend), vec![json!("rgb(0, 255, 0)")]);
        }

        #[test]
        fn test_from_settings_duration() {
            let settings = Settings::default().with_highlight_duration(Duration::from_millis(5));
            let listener = HighlightListener::from_settings(&settings);
            assert_eq!(listener.duration, Duration::from_millis(5));
        }

        #[test]
        fn test_demo_mode_session_highlights() {
            let backend = button_backend();
            let session = Session::builder(backend.clone())
                .settings(Settings::default().with_demo_mode(true))
                .build();
            retry::with_config(RetryConfig::once(), || {
                session.find(Locator::id("btn")).hover().map(|_| ())
            })
            .unwrap();
            assert_eq!(outline_colors(&backend).len(), 1);
        }
    }

    mod info {
        use super::*;

        #[test]
        fn test_display() {
            let info = AssertionInfo::new("UiElement(By.id(x))[0] .text", "to be [a]");
            assert_eq!(info.to_string(), "UiElement(By.id(x))[0] .text to be [a]");
        }
    }
}
