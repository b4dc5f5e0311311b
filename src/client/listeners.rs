//! Error listener registry.
//!
//! Shared by signaling client implementations to fan one failure out to
//! every subscriber.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::error::Error;
use crate::identifiers::SubscriptionId;

use super::ErrorListener;

// ============================================================================
// ErrorListeners
// ============================================================================

/// Thread-safe set of error listeners keyed by [`SubscriptionId`].
///
/// Listeners are invoked outside the lock, so a listener may subscribe or
/// unsubscribe while being called.
#[derive(Default)]
pub struct ErrorListeners {
    /// Registered listeners.
    listeners: Mutex<FxHashMap<SubscriptionId, ErrorListener>>,
}

impl ErrorListeners {
    /// Creates an empty registry.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener and returns its ID.
    pub fn subscribe(&self, listener: ErrorListener) -> SubscriptionId {
        let id = SubscriptionId::generate();
        self.listeners.lock().insert(id, listener);
        trace!(%id, "Error listener subscribed");
        id
    }

    /// Removes a listener.
    ///
    /// Returns `true` if the listener was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.listeners.lock().remove(&id).is_some();
        trace!(%id, removed, "Error listener unsubscribed");
        removed
    }

    /// Delivers an error to every registered listener.
    ///
    /// Returns the number of listeners called.
    pub fn emit(&self, error: Error) -> usize {
        let snapshot: Vec<ErrorListener> = self.listeners.lock().values().cloned().collect();
        let error = Arc::new(error);

        for listener in &snapshot {
            listener(Arc::clone(&error));
        }

        snapshot.len()
    }

    /// Returns the number of registered listeners.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Returns `true` if no listener is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.lock().is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
