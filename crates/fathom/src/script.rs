//! Script snippets executed through [`Backend::execute_script`].
//!
//! Element handles are passed as `arguments[0]`, values follow.

use std::time::Duration;

use serde_json::json;

use crate::backend::{Backend, ElementHandle, ScriptArg};
use crate::geometry::{Color, Location, Rect};
use crate::result::FathomResult;

/// Returns the viewport in client coordinates as `{left, top, width, height}`
pub const VIEWPORT: &str =
    "return {left: 0, top: 0, width: window.innerWidth, height: window.innerHeight};";

/// Scrolls so the element sits in the middle of the viewport, shifted by an offset
pub const SCROLL_TO_CENTER: &str = "const rect = arguments[0].getBoundingClientRect(); \
window.scrollBy(rect.left - window.innerWidth / 2 + rect.width / 2 + arguments[1], \
rect.top - window.innerHeight / 2 + rect.height / 2 + arguments[2]);";

/// Scrolls so the element's top edge sits at the top of the viewport, shifted by an offset
pub const SCROLL_TO_TOP: &str = "const rect = arguments[0].getBoundingClientRect(); \
window.scrollBy(rect.left + arguments[1], rect.top + arguments[2]);";

/// Outlines the element and restores the previous outline after a delay
pub const HIGHLIGHT: &str = "const el = arguments[0]; const previous = el.style.outline; \
el.style.outline = arguments[1] + ' solid 5px'; \
setTimeout(() => { el.style.outline = previous; }, arguments[2]);";

/// Read the current viewport rectangle
pub fn viewport(backend: &dyn Backend) -> FathomResult<Rect> {
    let value = backend.execute_script(VIEWPORT, &[])?;
    Ok(serde_json::from_value(value)?)
}

/// Scroll the element into the middle of the viewport
pub fn scroll_to_center(
    backend: &dyn Backend,
    handle: &ElementHandle,
    offset: Location,
) -> FathomResult<()> {
    backend.execute_script(SCROLL_TO_CENTER, &offset_args(handle, offset))?;
    Ok(())
}

/// Scroll the element to the top of the viewport
pub fn scroll_to_top(
    backend: &dyn Backend,
    handle: &ElementHandle,
    offset: Location,
) -> FathomResult<()> {
    backend.execute_script(SCROLL_TO_TOP, &offset_args(handle, offset))?;
    Ok(())
}

/// Outline the element with `color` for `duration`
pub fn highlight(
    backend: &dyn Backend,
    handle: &ElementHandle,
    color: Color,
    duration: Duration,
) -> FathomResult<()> {
    let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
    let args = [
        ScriptArg::from(handle),
        ScriptArg::Value(json!(color.to_string())),
        ScriptArg::Value(json!(millis)),
    ];
    backend.execute_script(HIGHLIGHT, &args)?;
    Ok(())
}

fn offset_args(handle: &ElementHandle, offset: Location) -> [ScriptArg; 3] {
    [
        ScriptArg::from(handle),
        ScriptArg::Value(json!(offset.x)),
        ScriptArg::Value(json!(offset.y)),
    ]
}
