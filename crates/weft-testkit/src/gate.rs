//! Validator whose calls complete only when the test says so.
//!
//! Each call to [`GatedValidator::validate`] takes the next call number and
//! parks until [`GateControl::release`] is called with that number, so tests
//! can resolve overlapping validations in any order.

use async_trait::async_trait;
use futures::channel::oneshot;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::trace;

use weft_core::{SchemaValidator, SyncValidator, ValidationResult, ValidatorFault};

enum Slot {
    Waiting(oneshot::Sender<()>),
    Released,
}

#[derive(Default)]
struct Gates {
    slots: Vec<Option<Slot>>,
    calls: usize,
}

impl Gates {
    fn slot_mut(&mut self, index: usize) -> &mut Option<Slot> {
        if self.slots.len() <= index {
            self.slots.resize_with(index + 1, || None);
        }
        &mut self.slots[index]
    }
}

/// Wraps a synchronous validator and holds each call at a gate.
pub struct GatedValidator<V> {
    inner: V,
    gates: Arc<Mutex<Gates>>,
}

/// Test-side handle for opening gates.
#[derive(Clone)]
pub struct GateControl {
    gates: Arc<Mutex<Gates>>,
}

impl<V> GatedValidator<V> {
    /// Wrap `inner`; returns the validator and its control handle.
    pub fn new(inner: V) -> (Self, GateControl) {
        let gates = Arc::new(Mutex::new(Gates::default()));
        (
            Self {
                inner,
                gates: gates.clone(),
            },
            GateControl { gates },
        )
    }
}

impl GateControl {
    /// Let call number `index` (0-based) finish. Releasing before the call
    /// arrives lets it pass straight through.
    pub fn release(&self, index: usize) {
        let mut gates = self.gates.lock();
        let slot = gates.slot_mut(index);
        if let Some(Slot::Waiting(tx)) = slot.take() {
            let _ = tx.send(());
        }
        *slot = Some(Slot::Released);
    }

    /// Number of calls that have reached the validator.
    pub fn calls(&self) -> usize {
        self.gates.lock().calls
    }
}

#[async_trait]
impl<T, V> SchemaValidator<T> for GatedValidator<V>
where
    T: Send + Sync,
    V: SyncValidator<T>,
{
    async fn validate(&self, candidate: &T) -> ValidationResult<T> {
        let waiting = {
            let mut gates = self.gates.lock();
            let index = gates.calls;
            gates.calls += 1;
            let slot = gates.slot_mut(index);
            match slot {
                Some(Slot::Released) => None,
                _ => {
                    let (tx, rx) = oneshot::channel();
                    *slot = Some(Slot::Waiting(tx));
                    Some((index, rx))
                }
            }
        };

        if let Some((index, rx)) = waiting {
            trace!(index, "validation parked at gate");
            rx.await
                .map_err(|_| ValidatorFault::internal("gate dropped before release"))?;
            trace!(index, "validation released");
        }
        self.inner.validate_sync(candidate)
    }
}
