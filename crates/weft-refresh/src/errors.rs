//! Listener faults and where they go
//!
//! A failing listener never stops a broadcast. Its fault is handed to the
//! bus's [`ErrorSink`]; the default sink logs it.

use std::any::Any;
use std::fmt;
use thiserror::Error;
use tracing::warn;

/// Result returned by a listener.
pub type ListenerResult = Result<(), ListenerError>;

/// Why a listener invocation failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListenerError {
    /// The listener reported a failure
    #[error("listener failed: {0}")]
    Failed(String),
    /// The listener panicked
    #[error("listener panicked: {0}")]
    Panicked(String),
}

impl ListenerError {
    /// Create a failure with the given message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::Panicked(message)
    }
}

/// Identifier assigned to a listener when it subscribes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(pub(crate) u64);

impl ListenerId {
    /// Raw numeric value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// A failed listener invocation, as reported to the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerFault {
    /// Listener that failed
    pub listener: ListenerId,
    /// Sequence number of the event being delivered
    pub sequence: u64,
    /// What went wrong
    pub error: ListenerError,
}

/// Receives listener faults.
pub trait ErrorSink: Send + Sync {
    /// Handle one fault. Must not panic.
    fn report(&self, fault: &ListenerFault);
}

impl<F> ErrorSink for F
where
    F: Fn(&ListenerFault) + Send + Sync,
{
    fn report(&self, fault: &ListenerFault) {
        self(fault);
    }
}

/// Default sink: logs each fault at `warn`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn report(&self, fault: &ListenerFault) {
        warn!(
            listener = %fault.listener,
            sequence = fault.sequence,
            error = %fault.error,
            "refresh listener failed"
        );
    }
}
