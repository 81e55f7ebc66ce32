//! Per-cycle dispatch snapshot and output handles.

use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

/// Opaque reference to a message already placed on the chat surface. Cloning
/// is cheap and preserves identity; two handles compare equal with
/// [`OutputHandle::same_as`] only when they refer to the same underlying
/// message, regardless of text content.
#[derive(Debug, Clone)]
pub struct OutputHandle(Arc<HandleInner>);

#[derive(Debug)]
struct HandleInner {
    id: String,
    text: Mutex<String>,
}

impl OutputHandle {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self(Arc::new(HandleInner {
            id: id.into(),
            text: Mutex::new(text.into()),
        }))
    }

    /// Handle with a freshly minted uuid.
    pub fn minted(text: impl Into<String>) -> Self {
        Self::new(Uuid::new_v4().to_string(), text)
    }

    pub fn id(&self) -> &str {
        &self.0.id
    }

    /// The text currently displayed for this message.
    pub fn text(&self) -> String {
        self.lock_text().clone()
    }

    /// Replaces the displayed text, typically after an update call succeeds.
    pub fn set_text(&self, text: impl Into<String>) {
        *self.lock_text() = text.into();
    }

    /// Identity comparison. Structural equality is deliberately not offered:
    /// two messages can carry identical text and still be distinct outputs.
    pub fn same_as(&self, other: &OutputHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn lock_text(&self) -> std::sync::MutexGuard<'_, String> {
        self.0.text.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Immutable snapshot handed to a sink variant for one dispatch cycle.
/// Constructed fresh each cycle; the sink never mutates it.
#[derive(Debug, Clone)]
pub struct DispatchState {
    /// Everything aggregated so far, in arrival order.
    pub text: String,
    /// True for exactly the first sink invocation of a session.
    pub is_first: bool,
    /// True when the queue was complete immediately after this cycle's drain.
    pub is_last: bool,
    /// 1-based count of sink invocations, this one included.
    pub iteration: u32,
    /// Handles returned by earlier invocations, deduplicated by identity.
    pub sent: Vec<OutputHandle>,
}

impl DispatchState {
    /// The whole response fits in one invocation.
    pub fn is_single(&self) -> bool {
        self.is_first && self.is_last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_identity_ignores_text() {
        let a = OutputHandle::new("1", "same text");
        let b = OutputHandle::new("1", "same text");
        assert!(!a.same_as(&b));
        assert!(a.same_as(&a.clone()));
    }

    #[test]
    fn handle_text_is_replaceable() {
        let handle = OutputHandle::minted("draft");
        handle.set_text("final");
        assert_eq!(handle.text(), "final");
    }

    #[test]
    fn single_means_first_and_last() {
        let state = DispatchState {
            text: "hi".into(),
            is_first: true,
            is_last: true,
            iteration: 1,
            sent: Vec::new(),
        };
        assert!(state.is_single());
    }
}
