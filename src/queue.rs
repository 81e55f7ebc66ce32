//! Hand-off queue between the stream ingestor and the paced dispatcher.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

/// Unbounded, order-preserving fragment queue with an irreversible closed
/// flag. This is the only structure shared between the two session tasks:
/// the ingestor pushes, the dispatcher drains.
#[derive(Debug, Default)]
pub struct FragmentQueue {
    items: Mutex<VecDeque<String>>,
    closed: AtomicBool,
}

impl FragmentQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, fragment: String) {
        self.lock_items().push_back(fragment);
    }

    /// Marks the producer side as finished. Idempotent; cannot be undone.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// A queue is complete once the producer has closed it and every queued
    /// fragment has been drained. Recomputed fresh on every call. The closed
    /// flag is read first: once it is observed true no further pushes can
    /// happen, so the emptiness check cannot miss a late arrival.
    pub fn is_complete(&self) -> bool {
        self.is_closed() && self.lock_items().is_empty()
    }

    /// Removes and returns everything present at the instant of the call.
    /// Never waits for more fragments to arrive; the snapshot length taken
    /// under the lock is the call's own upper bound.
    pub fn drain_current(&self) -> Vec<String> {
        let mut items = self.lock_items();
        let available = items.len();
        items.drain(..available).collect()
    }

    fn lock_items(&self) -> std::sync::MutexGuard<'_, VecDeque<String>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
