//! Resolution of a [`UiElement`] chain against the live document.
//!
//! Resolving a child first resolves its parent to a single handle, then
//! queries relative to it:
//!
//! 1. **Frame**: the backend enters the frame's document and the child's
//!    locator is queried from that document's root
//! 2. **Shadow host**: the child is queried inside the isolated sub-tree
//!    using the context-relative selector form
//! 3. **Plain element**: the child is queried as a descendant, again with
//!    the context-relative selector form
//!
//! A root element first leaves any previously entered frame. Shadow roots
//! are probed on every resolution, never cached.
//!
//! Candidates then pass the locator's filter, and finally the uniqueness
//! and index rules pick one handle.

use crate::backend::ElementHandle;
use crate::element::UiElement;
use crate::locator::Locator;
use crate::result::{FathomError, FathomResult};

impl UiElement {
    /// Resolve to exactly one handle.
    ///
    /// # Errors
    ///
    /// - [`FathomError::NotUnique`] if the locator demands uniqueness and
    ///   the candidate count is not 1
    /// - [`FathomError::NotFound`] if the index is out of range
    /// - Any backend failure while resolving the chain
    pub fn resolve(&self) -> FathomResult<ElementHandle> {
        let candidates = self.resolve_all()?;
        select(self.locator(), self.index(), candidates)
    }

    /// Resolve to every filtered candidate, skipping the uniqueness and
    /// index rules
    ///
    /// # Errors
    ///
    /// Returns an error if a parent cannot be resolved or a backend call fails
    pub fn resolve_all(&self) -> FathomResult<Vec<ElementHandle>> {
        let backend = self.session().backend();
        let locator = self.locator();

        let raw = match self.parent() {
            Some(parent) => {
                let context = parent.resolve()?;
                if backend.is_frame_like(&context)? {
                    backend.enter_frame(&context)?;
                    backend.query_all(None, locator.kind(), locator.value())?
                } else if backend.has_isolated_subtree(&context)? {
                    let root = backend.enter_isolated_subtree(&context)?;
                    backend.query_all(Some(&root), locator.kind(), &locator.relative_value())?
                } else {
                    backend.query_all(Some(&context), locator.kind(), &locator.relative_value())?
                }
            }
            None => {
                backend.exit_to_top_document()?;
                backend.query_all(None, locator.kind(), locator.value())?
            }
        };

        locator.apply_filter(backend, raw)
    }
}

/// Apply the uniqueness and index rules to filtered candidates
pub(crate) fn select(
    locator: &Locator,
    index: isize,
    candidates: Vec<ElementHandle>,
) -> FathomResult<ElementHandle> {
    let count = candidates.len();
    if locator.is_unique() && count != 1 {
        return Err(FathomError::NotUnique {
            locator: locator.to_string(),
            count,
        });
    }

    let position = if index < 0 {
        count as isize + index
    } else {
        index
    };

    usize::try_from(position)
        .ok()
        .and_then(|p| candidates.into_iter().nth(p))
        .ok_or_else(|| FathomError::NotFound {
            locator: locator.to_string(),
            index,
        })
}
