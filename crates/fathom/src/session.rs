//! Session: the entry point tying a backend, observation hooks and
//! settings together.

use std::fmt;
use std::sync::Arc;

use crate::assertion::{Assert, AssertKind, AssertionNode, Value};
use crate::backend::Backend;
use crate::element::UiElement;
use crate::listener::{HighlightListener, Listener, NoopListener};
use crate::locator::Locator;
use crate::result::FathomResult;
use crate::settings::Settings;

struct SessionInner {
    backend: Arc<dyn Backend>,
    listener: Arc<dyn Listener>,
    settings: Settings,
}

/// Shared context for every element found through it.
///
/// Cloning is cheap; clones share the same backend and listener.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Session with settings from the environment.
    ///
    /// Demo mode installs a [`HighlightListener`]; otherwise hooks are no-ops.
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self::builder(backend).build()
    }

    /// Start building a session
    #[must_use]
    pub fn builder(backend: Arc<dyn Backend>) -> SessionBuilder {
        SessionBuilder::new(backend)
    }

    /// Backend in use
    #[must_use]
    pub fn backend(&self) -> &dyn Backend {
        self.inner.backend.as_ref()
    }

    /// Installed observation hooks
    #[must_use]
    pub fn listener(&self) -> &Arc<dyn Listener> {
        &self.inner.listener
    }

    /// Session settings
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    /// Root element resolved against the top-level document
    #[must_use]
    pub fn find(&self, locator: impl Into<Locator>) -> UiElement {
        UiElement::root(self.clone(), locator.into(), None)
    }

    /// Root element with a display name used in failure messages
    #[must_use]
    pub fn find_named(&self, locator: impl Into<Locator>, name: impl Into<String>) -> UiElement {
        UiElement::root(self.clone(), locator.into(), Some(name.into()))
    }

    /// Raising assertion over an arbitrary value, observed by this
    /// session's hooks
    pub fn expect_that<K, V, F>(&self, name: impl Into<String>, supplier: F) -> Assert<K>
    where
        K: AssertKind,
        V: Into<Value>,
        F: Fn() -> FathomResult<V> + Send + Sync + 'static,
    {
        self.supplied(name.into(), supplier, true)
    }

    /// Non-raising variant of [`Self::expect_that`]
    pub fn wait_for_that<K, V, F>(&self, name: impl Into<String>, supplier: F) -> Assert<K>
    where
        K: AssertKind,
        V: Into<Value>,
        F: Fn() -> FathomResult<V> + Send + Sync + 'static,
    {
        self.supplied(name.into(), supplier, false)
    }

    fn supplied<K, V, F>(&self, name: String, supplier: F, raise: bool) -> Assert<K>
    where
        K: AssertKind,
        V: Into<Value>,
        F: Fn() -> FathomResult<V> + Send + Sync + 'static,
    {
        let node = AssertionNode::supplied(
            name,
            Arc::new(move || -> FathomResult<Value> { supplier().map(Into::into) }),
            raise,
            Some(Arc::clone(&self.inner.listener)),
        );
        Assert::from_node(node)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("settings", &self.inner.settings)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Session`]
pub struct SessionBuilder {
    backend: Arc<dyn Backend>,
    listener: Option<Arc<dyn Listener>>,
    settings: Option<Settings>,
}

impl SessionBuilder {
    /// Create a builder for `backend`
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            listener: None,
            settings: None,
        }
    }

    /// Use explicit settings instead of the environment
    #[must_use]
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Install observation hooks
    #[must_use]
    pub fn listener(mut self, listener: Arc<dyn Listener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Build the session
    #[must_use]
    pub fn build(self) -> Session {
        let settings = self
            .settings
            .unwrap_or_else(Settings::from_env_or_default);
        let listener: Arc<dyn Listener> = match self.listener {
            Some(listener) => listener,
            None if settings.demo_mode => Arc::new(HighlightListener::from_settings(&settings)),
            None => Arc::new(NoopListener),
        };
        Session {
            inner: Arc::new(SessionInner {
                backend: self.backend,
                listener,
                settings,
            }),
        }
    }
}

impl fmt::Debug for SessionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionBuilder")
            .field("settings", &self.settings)
            .field("listener", &self.listener.is_some())
            .finish_non_exhaustive()
    }
}
