//! Ordered record of calls made by test listeners and handlers.

use parking_lot::Mutex;
use std::sync::Arc;

/// Cloneable, thread-safe list of labels in call order.
#[derive(Clone, Debug, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `label`.
    pub fn push(&self, label: impl Into<String>) {
        self.entries.lock().push(label.into());
    }

    /// Copy of all entries so far.
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// How often `label` was recorded.
    pub fn count(&self, label: &str) -> usize {
        self.entries.lock().iter().filter(|e| *e == label).count()
    }

    /// Forget all entries.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}
