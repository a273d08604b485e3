//! Retrying actions on resolved elements.
//!
//! Every action resolves the element chain and invokes one backend
//! primitive inside the active retry [`Sequence`]. Listeners see each
//! failed attempt and the final outcome; a final failure is returned with
//! the element's name path as its diagnostic subject.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;
use tracing::{debug, info};

use crate::backend::{Backend, ElementHandle};
use crate::element::UiElement;
use crate::geometry::{Color, Location};
use crate::listener::{notify, HIGHLIGHT_ACTION};
use crate::result::{FathomError, FathomResult};
use crate::retry::Sequence;
use crate::script;

impl UiElement {
    /// Run `primitive` on the resolved element under the active retry
    /// configuration, notifying listeners as `action`
    fn run_action<T, F>(&self, action: &str, mut primitive: F) -> FathomResult<T>
    where
        F: FnMut(&dyn Backend, &ElementHandle) -> FathomResult<T>,
    {
        let backend = self.session().backend();
        let listener = self.session().listener();

        let outcome = Sequence::current().run(
            || {
                let handle = self.resolve()?;
                primitive(backend, &handle)
            },
            |err, _| notify("action_failed", || listener.action_failed(action, self, err)),
        );

        match outcome {
            Ok(value) => {
                notify("action_passed", || listener.action_passed(action, self));
                Ok(value)
            }
            Err(err) => {
                debug!(action, "{} failed: {err}", self.name());
                notify("action_failed_finally", || {
                    listener.action_failed_finally(action, self, &err)
                });
                Err(err.with_subject(self.name_trail()))
            }
        }
    }

    fn perform<F>(&self, action: &str, primitive: F) -> FathomResult<&Self>
    where
        F: FnMut(&dyn Backend, &ElementHandle) -> FathomResult<()>,
    {
        self.run_action(action, primitive)?;
        Ok(self)
    }

    /// Click
    ///
    /// # Errors
    ///
    /// Returns [`FathomError::RetryExhausted`] once every attempt failed
    pub fn click(&self) -> FathomResult<&Self> {
        self.perform("click", |backend, handle| backend.click(handle))
    }

    /// Move the pointer over the element
    ///
    /// # Errors
    ///
    /// Returns [`FathomError::RetryExhausted`] once every attempt failed
    pub fn hover(&self) -> FathomResult<&Self> {
        self.perform("hover", |backend, handle| backend.hover(handle))
    }

    /// Secondary click
    ///
    /// # Errors
    ///
    /// Returns [`FathomError::RetryExhausted`] once every attempt failed
    pub fn context_click(&self) -> FathomResult<&Self> {
        self.perform("context_click", |backend, handle| backend.context_click(handle))
    }

    /// Double click
    ///
    /// # Errors
    ///
    /// Returns [`FathomError::RetryExhausted`] once every attempt failed
    pub fn double_click(&self) -> FathomResult<&Self> {
        self.perform("double_click", |backend, handle| backend.double_click(handle))
    }

    /// Press and hold
    ///
    /// # Errors
    ///
    /// Returns [`FathomError::RetryExhausted`] once every attempt failed
    pub fn long_click(&self) -> FathomResult<&Self> {
        self.perform("long_click", |backend, handle| backend.long_click(handle))
    }

    /// Append `text` to the element's input
    ///
    /// # Errors
    ///
    /// Returns [`FathomError::RetryExhausted`] once every attempt failed
    pub fn send_keys(&self, text: &str) -> FathomResult<&Self> {
        self.perform("send_keys", |backend, handle| backend.send_keys(handle, text))
    }

    /// Clear the field, type `text` and check that the field now holds
    /// exactly `text`, all within one attempt
    ///
    /// # Errors
    ///
    /// Returns [`FathomError::RetryExhausted`] once every attempt failed,
    /// including attempts where the field ended up with another value
    pub fn type_text(&self, text: &str) -> FathomResult<&Self> {
        self.perform("type_text", |backend, handle| {
            backend.clear(handle)?;
            backend.send_keys(handle, text)?;
            let actual = backend.attribute(handle, "value")?;
            if actual.as_deref() == Some(text) {
                Ok(())
            } else {
                Err(FathomError::assertion(format!(
                    "Expected value [{}] to be [{text}]",
                    actual.as_deref().unwrap_or("null")
                )))
            }
        })
    }

    /// Clear an editable element
    ///
    /// # Errors
    ///
    /// Returns [`FathomError::RetryExhausted`] once every attempt failed
    pub fn clear(&self) -> FathomResult<&Self> {
        self.perform("clear", |backend, handle| backend.clear(handle))
    }

    /// Submit the element's form
    ///
    /// # Errors
    ///
    /// Returns [`FathomError::RetryExhausted`] once every attempt failed
    pub fn submit(&self) -> FathomResult<&Self> {
        self.perform("submit", |backend, handle| backend.submit(handle))
    }

    /// Drag this element onto `target`; both are resolved on every attempt
    ///
    /// # Errors
    ///
    /// Returns [`FathomError::RetryExhausted`] once every attempt failed
    pub fn drag_and_drop_to(&self, target: &UiElement) -> FathomResult<&Self> {
        self.perform("drag_and_drop_to", |backend, handle| {
            let destination = target.resolve()?;
            backend.drag_to(handle, &destination)
        })
    }

    /// Scroll the element into the middle of the viewport, shifted by `offset`
    ///
    /// # Errors
    ///
    /// Returns [`FathomError::RetryExhausted`] once every attempt failed
    pub fn scroll_into_view(&self, offset: Location) -> FathomResult<&Self> {
        self.perform("scroll_into_view", |backend, handle| {
            script::scroll_to_center(backend, handle, offset)
        })
    }

    /// Scroll the element's top edge to the top of the viewport, shifted by `offset`
    ///
    /// # Errors
    ///
    /// Returns [`FathomError::RetryExhausted`] once every attempt failed
    pub fn scroll_to_top(&self, offset: Location) -> FathomResult<&Self> {
        self.perform("scroll_to_top", |backend, handle| {
            script::scroll_to_top(backend, handle, offset)
        })
    }

    /// Outline the element with `color` for `duration`
    ///
    /// # Errors
    ///
    /// Returns [`FathomError::RetryExhausted`] once every attempt failed
    pub fn highlight(&self, color: Color, duration: Duration) -> FathomResult<&Self> {
        self.perform(HIGHLIGHT_ACTION, |backend, handle| {
            script::highlight(backend, handle, color, duration)
        })
    }

    /// Capture the element as PNG into the configured screenshots directory.
    ///
    /// The file is named after the element and the current local time.
    ///
    /// # Errors
    ///
    /// Returns an error if the screenshot cannot be taken after every
    /// attempt, or if the file cannot be written
    pub fn take_screenshot(&self) -> FathomResult<PathBuf> {
        let png = self.run_action("take_screenshot", |backend, handle| backend.screenshot(handle))?;

        let dir = &self.session().settings().screenshots_dir;
        fs::create_dir_all(dir)?;
        let stamp = Local::now().format("%Y%m%d-%H%M%S%.3f");
        let path = dir.join(format!("{}-{stamp}.png", file_stem(&self.name())));
        fs::write(&path, png)?;
        info!("Screenshot saved to {}", path.display());
        Ok(path)
    }
}

/// Element name reduced to characters safe in file names
fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    let stem = stem.trim_matches('_');
    if stem.is_empty() {
        "element".to_string()
    } else {
        stem.to_string()
    }
}
