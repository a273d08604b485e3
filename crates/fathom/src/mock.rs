//! In-memory backend for unit testing.
//!
//! [`MockBackend`] models a document as a set of elements keyed by id plus
//! scripted query responses. Responses registered for the same query are
//! served in order and the last one keeps repeating, which makes it easy to
//! model a document that settles over time:
//!
//! ```
//! use fathom::mock::{MockBackend, MockElement, Scope};
//! use fathom::{Backend, SelectorKind};
//!
//! let backend = MockBackend::new();
//! backend.add_element("p1", MockElement::new("p"));
//! backend.add_element("p2", MockElement::new("p"));
//! backend.respond(Scope::Document, SelectorKind::TagName, "p", &["p1", "p2"]);
//! backend.respond(Scope::Document, SelectorKind::TagName, "p", &["p1"]);
//!
//! assert_eq!(backend.query_all(None, SelectorKind::TagName, "p").unwrap().len(), 2);
//! assert_eq!(backend.query_all(None, SelectorKind::TagName, "p").unwrap().len(), 1);
//! assert_eq!(backend.query_all(None, SelectorKind::TagName, "p").unwrap().len(), 1);
//! ```
//!
//! Every call is recorded in a call history for verification.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::backend::{Backend, ElementHandle, ScriptArg, SelectorKind};
use crate::geometry::Rect;
use crate::result::{FathomError, FathomResult};
use crate::script;

/// Suffix of context handles returned for shadow roots
pub const SHADOW_ROOT_SUFFIX: &str = "#shadow-root";

/// A mock document node
#[derive(Debug, Clone, PartialEq)]
pub struct MockElement {
    /// Tag name
    pub tag: String,
    /// Text content
    pub text: String,
    /// Attributes and properties
    pub attributes: HashMap<String, String>,
    /// Computed CSS properties
    pub css: HashMap<String, String>,
    /// Displayed flag
    pub displayed: bool,
    /// Enabled flag
    pub enabled: bool,
    /// Selected flag
    pub selected: bool,
    /// Bounding rectangle
    pub rect: Rect,
    /// Whether the element hosts a shadow root
    pub shadow_root: bool,
    /// PNG bytes returned by screenshots
    pub screenshot: Vec<u8>,
}

impl MockElement {
    /// Create a displayed, enabled element with the given tag
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            text: String::new(),
            attributes: HashMap::new(),
            css: HashMap::new(),
            displayed: true,
            enabled: true,
            selected: false,
            rect: Rect::new(0.0, 0.0, 10.0, 10.0),
            shadow_root: false,
            screenshot: Vec::new(),
        }
    }

    /// Set the text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set a computed CSS property
    #[must_use]
    pub fn with_css(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.css.insert(name.into(), value.into());
        self
    }

    /// Set the bounding rectangle
    #[must_use]
    pub const fn with_rect(mut self, rect: Rect) -> Self {
        self.rect = rect;
        self
    }

    /// Set the screenshot bytes
    #[must_use]
    pub fn with_screenshot(mut self, png: Vec<u8>) -> Self {
        self.screenshot = png;
        self
    }

    /// Mark as not displayed
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    /// Mark as disabled
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Mark as selected
    #[must_use]
    pub const fn selected(mut self) -> Self {
        self.selected = true;
        self
    }

    /// Attach a shadow root
    #[must_use]
    pub const fn with_shadow_root(mut self) -> Self {
        self.shadow_root = true;
        self
    }
}

/// Where a scripted query response applies
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Top-level document
    Document,
    /// Document of the frame element with this id
    Frame(String),
    /// Descendants of the element (or shadow root context) with this id
    Context(String),
}

impl Scope {
    /// Scope for the shadow root hosted by element `id`
    #[must_use]
    pub fn shadow_root(id: &str) -> Self {
        Self::Context(format!("{id}{SHADOW_ROOT_SUFFIX}"))
    }
}

type QueryKey = (Scope, SelectorKind, String);

#[derive(Debug, Default)]
struct MockState {
    elements: HashMap<String, MockElement>,
    responses: HashMap<QueryKey, VecDeque<Vec<ElementHandle>>>,
    frame: Option<String>,
    failures: HashMap<String, usize>,
    script_results: VecDeque<serde_json::Value>,
    scripts: Vec<(String, Vec<ScriptArg>)>,
    viewport: Rect,
    call_history: Vec<String>,
}

/// Scriptable in-memory [`Backend`]
#[derive(Debug, Default)]
pub struct MockBackend {
    state: Mutex<MockState>,
}

impl MockBackend {
    /// Create an empty mock document with an 800x600 viewport
    #[must_use]
    pub fn new() -> Self {
        let backend = Self::default();
        backend.lock().viewport = Rect::new(0.0, 0.0, 800.0, 600.0);
        backend
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add or replace an element
    pub fn add_element(&self, id: impl Into<String>, element: MockElement) {
        self.lock().elements.insert(id.into(), element);
    }

    /// Snapshot of an element's current state
    #[must_use]
    pub fn element(&self, id: &str) -> Option<MockElement> {
        self.lock().elements.get(id).cloned()
    }

    /// Queue a query response; the last queued response repeats
    pub fn respond(&self, scope: Scope, kind: SelectorKind, value: &str, ids: &[&str]) {
        let handles = ids.iter().map(|id| ElementHandle::new(*id)).collect();
        self.lock()
            .responses
            .entry((scope, kind, value.to_string()))
            .or_default()
            .push_back(handles);
    }

    /// Make the next `times` calls of primitive `operation` fail
    pub fn fail_next(&self, operation: &str, times: usize) {
        self.lock().failures.insert(operation.to_string(), times);
    }

    /// Set the viewport reported to scripts
    pub fn set_viewport(&self, viewport: Rect) {
        self.lock().viewport = viewport;
    }

    /// Queue a result for the next script execution
    pub fn push_script_result(&self, value: serde_json::Value) {
        self.lock().script_results.push_back(value);
    }

    /// Scripts executed so far, with their arguments
    #[must_use]
    pub fn scripts(&self) -> Vec<(String, Vec<ScriptArg>)> {
        self.lock().scripts.clone()
    }

    /// Id of the currently entered frame
    #[must_use]
    pub fn current_frame(&self) -> Option<String> {
        self.lock().frame.clone()
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock().call_history.clone()
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.lock()
            .call_history
            .iter()
            .any(|c| c.starts_with(method))
    }

    /// Count calls whose record starts with `prefix`
    #[must_use]
    pub fn call_count(&self, prefix: &str) -> usize {
        self.lock()
            .call_history
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Forget recorded calls
    pub fn clear_history(&self) {
        self.lock().call_history.clear();
    }

    fn record(state: &mut MockState, call: String) {
        state.call_history.push(call);
    }

    fn injected_failure(state: &mut MockState, operation: &str) -> FathomResult<()> {
        if let Some(remaining) = state.failures.get_mut(operation) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(FathomError::backend(operation, "injected failure"));
            }
        }
        Ok(())
    }

    fn with_element<T>(
        &self,
        operation: &str,
        handle: &ElementHandle,
        read: impl FnOnce(&mut MockElement) -> T,
    ) -> FathomResult<T> {
        let mut state = self.lock();
        Self::record(&mut state, format!("{operation}:{handle}"));
        Self::injected_failure(&mut state, operation)?;
        state
            .elements
            .get_mut(handle.id())
            .map(read)
            .ok_or_else(|| FathomError::backend(operation, format!("no such element: {handle}")))
    }
}

impl Backend for MockBackend {
    fn query_all(
        &self,
        context: Option<&ElementHandle>,
        kind: SelectorKind,
        value: &str,
    ) -> FathomResult<Vec<ElementHandle>> {
        let mut state = self.lock();
        let scope = match (context, &state.frame) {
            (Some(handle), _) => Scope::Context(handle.id().to_string()),
            (None, Some(frame)) => Scope::Frame(frame.clone()),
            (None, None) => Scope::Document,
        };
        let scope_name = match &scope {
            Scope::Document => "document".to_string(),
            Scope::Frame(id) => format!("frame {id}"),
            Scope::Context(id) => id.clone(),
        };
        Self::record(&mut state, format!("query_all:{scope_name}:{kind}:{value}"));
        Self::injected_failure(&mut state, "query_all")?;

        let key = (scope, kind, value.to_string());
        let Some(queue) = state.responses.get_mut(&key) else {
            return Ok(Vec::new());
        };
        let handles = if queue.len() > 1 {
            queue.pop_front().unwrap_or_default()
        } else {
            queue.front().cloned().unwrap_or_default()
        };
        Ok(handles)
    }

    fn enter_frame(&self, frame: &ElementHandle) -> FathomResult<()> {
        let mut state = self.lock();
        Self::record(&mut state, format!("enter_frame:{frame}"));
        Self::injected_failure(&mut state, "enter_frame")?;
        state.frame = Some(frame.id().to_string());
        Ok(())
    }

    fn exit_to_top_document(&self) -> FathomResult<()> {
        let mut state = self.lock();
        Self::record(&mut state, "exit_to_top_document".to_string());
        state.frame = None;
        Ok(())
    }

    fn has_isolated_subtree(&self, handle: &ElementHandle) -> FathomResult<bool> {
        self.with_element("has_isolated_subtree", handle, |e| e.shadow_root)
    }

    fn enter_isolated_subtree(&self, handle: &ElementHandle) -> FathomResult<ElementHandle> {
        self.with_element("enter_isolated_subtree", handle, |_| {
            ElementHandle::new(format!("{handle}{SHADOW_ROOT_SUFFIX}"))
        })
    }

    fn click(&self, handle: &ElementHandle) -> FathomResult<()> {
        self.with_element("click", handle, |_| ())
    }

    fn hover(&self, handle: &ElementHandle) -> FathomResult<()> {
        self.with_element("hover", handle, |_| ())
    }

    fn context_click(&self, handle: &ElementHandle) -> FathomResult<()> {
        self.with_element("context_click", handle, |_| ())
    }

    fn double_click(&self, handle: &ElementHandle) -> FathomResult<()> {
        self.with_element("double_click", handle, |_| ())
    }

    fn long_click(&self, handle: &ElementHandle) -> FathomResult<()> {
        self.with_element("long_click", handle, |_| ())
    }

    fn send_keys(&self, handle: &ElementHandle, text: &str) -> FathomResult<()> {
        self.with_element("send_keys", handle, |e| {
            e.attributes
                .entry("value".to_string())
                .or_default()
                .push_str(text);
        })
    }

    fn clear(&self, handle: &ElementHandle) -> FathomResult<()> {
        self.with_element("clear", handle, |e| {
            e.attributes.insert("value".to_string(), String::new());
        })
    }

    fn submit(&self, handle: &ElementHandle) -> FathomResult<()> {
        self.with_element("submit", handle, |_| ())
    }

    fn drag_to(&self, handle: &ElementHandle, target: &ElementHandle) -> FathomResult<()> {
        let mut state = self.lock();
        Self::record(&mut state, format!("drag_to:{handle}->{target}"));
        Self::injected_failure(&mut state, "drag_to")?;
        if state.elements.contains_key(handle.id()) && state.elements.contains_key(target.id()) {
            Ok(())
        } else {
            Err(FathomError::backend("drag_to", "no such element"))
        }
    }

    fn text(&self, handle: &ElementHandle) -> FathomResult<String> {
        self.with_element("text", handle, |e| e.text.clone())
    }

    fn tag_name(&self, handle: &ElementHandle) -> FathomResult<String> {
        self.with_element("tag_name", handle, |e| e.tag.clone())
    }

    fn is_displayed(&self, handle: &ElementHandle) -> FathomResult<bool> {
        self.with_element("is_displayed", handle, |e| e.displayed)
    }

    fn is_enabled(&self, handle: &ElementHandle) -> FathomResult<bool> {
        self.with_element("is_enabled", handle, |e| e.enabled)
    }

    fn is_selected(&self, handle: &ElementHandle) -> FathomResult<bool> {
        self.with_element("is_selected", handle, |e| e.selected)
    }

    fn attribute(&self, handle: &ElementHandle, name: &str) -> FathomResult<Option<String>> {
        self.with_element("attribute", handle, |e| e.attributes.get(name).cloned())
    }

    fn css_property(&self, handle: &ElementHandle, name: &str) -> FathomResult<String> {
        self.with_element("css_property", handle, |e| {
            e.css.get(name).cloned().unwrap_or_default()
        })
    }

    fn bounding_rect(&self, handle: &ElementHandle) -> FathomResult<Rect> {
        self.with_element("bounding_rect", handle, |e| e.rect)
    }

    fn execute_script(&self, script: &str, args: &[ScriptArg]) -> FathomResult<serde_json::Value> {
        let mut state = self.lock();
        Self::record(&mut state, "execute_script".to_string());
        Self::injected_failure(&mut state, "execute_script")?;
        state.scripts.push((script.to_string(), args.to_vec()));
        if script == script::VIEWPORT {
            return Ok(serde_json::to_value(state.viewport)?);
        }
        Ok(state
            .script_results
            .pop_front()
            .unwrap_or(serde_json::Value::Null))
    }

    fn screenshot(&self, handle: &ElementHandle) -> FathomResult<Vec<u8>> {
        self.with_element("screenshot", handle, |e| e.screenshot.clone())
    }
}
