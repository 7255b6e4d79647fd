//! Shared log of `error` frame payloads.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;

/// Error payloads captured from a stream in interactive mode.
///
/// Cloning shares the underlying list, so a handle kept in a collection's
/// metadata sees errors appended while the stream is iterated. Each stream
/// should get its own log; the list is appended to from a single adapter at
/// a time.
#[derive(Debug, Clone, Default)]
pub struct ErrorLog {
    entries: Arc<Mutex<Vec<Value>>>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, payload: Value) {
        self.lock().push(payload);
    }

    /// Copy of the payloads recorded so far.
    pub fn snapshot(&self) -> Vec<Value> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Value>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PartialEq for ErrorLog {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries) || self.snapshot() == other.snapshot()
    }
}
