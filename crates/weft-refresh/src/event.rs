//! Refresh events and delivery reports

use chrono::{DateTime, Utc};
use std::fmt;

/// Callback run once every listener has been invoked for a request.
pub type Completion = Box<dyn FnOnce(&DeliveryReport) + Send>;

/// One "refresh requested" broadcast.
///
/// Created by [`RefreshBus::request`](crate::RefreshBus::request), lent to
/// every subscribed listener, then dropped. Never stored by the bus.
pub struct RefreshEvent {
    sequence: u64,
    requested_at: DateTime<Utc>,
    pub(crate) completion: Option<Completion>,
}

impl RefreshEvent {
    pub(crate) fn new(sequence: u64, completion: Option<Completion>) -> Self {
        Self {
            sequence,
            requested_at: Utc::now(),
            completion,
        }
    }

    /// Position of this request among all requests on the bus (starts at 1).
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// When the request was made.
    pub fn requested_at(&self) -> DateTime<Utc> {
        self.requested_at
    }

    /// Whether the requester is waiting for a completion callback.
    pub fn has_completion(&self) -> bool {
        self.completion.is_some()
    }
}

impl fmt::Debug for RefreshEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshEvent")
            .field("sequence", &self.sequence)
            .field("requested_at", &self.requested_at)
            .field("has_completion", &self.has_completion())
            .finish()
    }
}

/// Outcome of one broadcast.
///
/// Counts only say whether each listener's handler was invoked; work the
/// listeners started asynchronously may still be running.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Sequence number of the event
    pub sequence: u64,
    /// Listeners that returned normally
    pub delivered: usize,
    /// Listeners that returned an error or panicked
    pub failed: usize,
}

impl DeliveryReport {
    /// Total listeners invoked.
    #[must_use]
    pub fn invoked(&self) -> usize {
        self.delivered + self.failed
    }

    /// Whether every invoked listener succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}
