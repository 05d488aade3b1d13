//! # Refresh Signal Bus
//!
//! [`RefreshBus`] lets any code path ask unrelated parts of the application
//! to re-fetch or recompute their data without holding references to them.
//!
//! ## Lifetime
//!
//! Construct one bus at application start-up and hand clones to whatever
//! needs it; clones share the same subscriber set. The bus is an ordinary
//! value, so tests build a fresh one each.
//!
//! ## Delivery
//!
//! `request` is synchronous and unfiltered: every listener subscribed at the
//! moment of the call is invoked once, in subscription order, before
//! `request` returns. Listeners that need to do async work should start it
//! and return; the bus does not wait for it.
//!
//! The subscriber set is snapshotted before dispatch, so listeners may
//! subscribe or unsubscribe (themselves or others) while a broadcast is
//! running. New listeners only see later requests; a listener removed
//! mid-broadcast is skipped if it has not been reached yet.
//!
//! ```rust,ignore
//! let bus = RefreshBus::new();
//! let contacts = bus.subscribe_infallible(move |_| reload_contacts());
//!
//! // after a mutation succeeds, anywhere in the app:
//! bus.request_with(|report| tracing::debug!(?report, "refresh sent"));
//! ```

use parking_lot::RwLock;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

use crate::errors::{ErrorSink, ListenerError, ListenerFault, ListenerId, ListenerResult, TracingSink};
use crate::event::{Completion, DeliveryReport, RefreshEvent};

type Listener = Box<dyn Fn(&RefreshEvent) -> ListenerResult + Send + Sync>;

struct ListenerSlot {
    id: ListenerId,
    active: AtomicBool,
    listener: Listener,
}

impl ListenerSlot {
    fn invoke(&self, event: &RefreshEvent) -> ListenerResult {
        catch_unwind(AssertUnwindSafe(|| (self.listener)(event)))
            .unwrap_or_else(|payload| Err(ListenerError::from_panic(payload)))
    }
}

struct BusInner {
    slots: RwLock<Vec<Arc<ListenerSlot>>>,
    sink: RwLock<Arc<dyn ErrorSink>>,
    next_id: AtomicU64,
    sequence: AtomicU64,
}

impl BusInner {
    fn remove(&self, id: ListenerId) -> bool {
        let mut slots = self.slots.write();
        let Some(index) = slots.iter().position(|slot| slot.id == id) else {
            return false;
        };
        let slot = slots.remove(index);
        slot.active.store(false, Ordering::Release);
        debug!(listener = %id, remaining = slots.len(), "refresh listener unsubscribed");
        true
    }
}

/// Process-lifetime broadcast channel for refresh requests.
#[derive(Clone)]
pub struct RefreshBus {
    inner: Arc<BusInner>,
}

impl Default for RefreshBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RefreshBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshBus")
            .field("subscribers", &self.subscriber_count())
            .field("requests", &self.inner.sequence.load(Ordering::Acquire))
            .finish()
    }
}

impl RefreshBus {
    /// Create a bus whose listener faults are logged.
    pub fn new() -> Self {
        Self::with_error_sink(TracingSink)
    }

    /// Create a bus that reports listener faults to `sink`.
    pub fn with_error_sink(sink: impl ErrorSink + 'static) -> Self {
        Self {
            inner: Arc::new(BusInner {
                slots: RwLock::new(Vec::new()),
                sink: RwLock::new(Arc::new(sink)),
                next_id: AtomicU64::new(1),
                sequence: AtomicU64::new(0),
            }),
        }
    }

    /// Replace the fault sink.
    pub fn set_error_sink(&self, sink: impl ErrorSink + 'static) {
        *self.inner.sink.write() = Arc::new(sink);
    }

    /// Register `listener` for every future request.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&RefreshEvent) -> ListenerResult + Send + Sync + 'static,
    {
        let id = ListenerId(self.inner.next_id.fetch_add(1, Ordering::AcqRel));
        let slot = Arc::new(ListenerSlot {
            id,
            active: AtomicBool::new(true),
            listener: Box::new(listener),
        });
        let count = {
            let mut slots = self.inner.slots.write();
            slots.push(slot.clone());
            slots.len()
        };
        debug!(listener = %id, subscribers = count, "refresh listener subscribed");
        Subscription {
            id,
            slot: Arc::downgrade(&slot),
            bus: Arc::downgrade(&self.inner),
            attached: true,
        }
    }

    /// Register a listener that cannot fail.
    pub fn subscribe_infallible<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&RefreshEvent) + Send + Sync + 'static,
    {
        self.subscribe(move |event| {
            listener(event);
            Ok(())
        })
    }

    /// Broadcast a refresh request to every current subscriber.
    pub fn request(&self) -> DeliveryReport {
        self.dispatch(None)
    }

    /// Broadcast, then run `on_complete` once every listener was invoked.
    pub fn request_with<F>(&self, on_complete: F) -> DeliveryReport
    where
        F: FnOnce(&DeliveryReport) + Send + 'static,
    {
        self.dispatch(Some(Box::new(on_complete)))
    }

    /// Number of registered listeners.
    pub fn subscriber_count(&self) -> usize {
        self.inner.slots.read().len()
    }

    fn dispatch(&self, completion: Option<Completion>) -> DeliveryReport {
        let sequence = self.inner.sequence.fetch_add(1, Ordering::AcqRel) + 1;
        let mut event = RefreshEvent::new(sequence, completion);
        let snapshot: Vec<Arc<ListenerSlot>> = self.inner.slots.read().clone();
        debug!(sequence, listeners = snapshot.len(), "refresh requested");

        let mut report = DeliveryReport {
            sequence,
            ..DeliveryReport::default()
        };
        for slot in &snapshot {
            if !slot.active.load(Ordering::Acquire) {
                trace!(listener = %slot.id, sequence, "skipping listener removed mid-broadcast");
                continue;
            }
            match slot.invoke(&event) {
                Ok(()) => report.delivered += 1,
                Err(error) => {
                    report.failed += 1;
                    let fault = ListenerFault {
                        listener: slot.id,
                        sequence,
                        error,
                    };
                    let sink = self.inner.sink.read().clone();
                    sink.report(&fault);
                }
            }
        }

        trace!(
            sequence,
            delivered = report.delivered,
            failed = report.failed,
            "refresh broadcast finished"
        );
        if let Some(on_complete) = event.completion.take() {
            on_complete(&report);
        }
        report
    }
}

/// Handle to a registered listener.
///
/// Dropping the handle unsubscribes the listener; call
/// [`detach`](Self::detach) to keep it registered for the bus's lifetime.
#[must_use = "dropping a Subscription unsubscribes its listener"]
pub struct Subscription {
    id: ListenerId,
    slot: Weak<ListenerSlot>,
    bus: Weak<BusInner>,
    attached: bool,
}

impl Subscription {
    /// Identifier of the listener.
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Whether the listener is still registered.
    pub fn is_active(&self) -> bool {
        self.slot
            .upgrade()
            .is_some_and(|slot| slot.active.load(Ordering::Acquire))
    }

    /// Remove the listener. Returns `false` if it was already gone.
    pub fn unsubscribe(mut self) -> bool {
        self.release()
    }

    /// Keep the listener registered after this handle is dropped.
    pub fn detach(mut self) {
        self.attached = false;
    }

    fn release(&mut self) -> bool {
        if !self.attached {
            return false;
        }
        self.attached = false;
        self.bus.upgrade().is_some_and(|bus| bus.remove(self.id))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_sequence_numbers_increase() {
        let bus = RefreshBus::new();
        assert_eq!(bus.request().sequence, 1);
        assert_eq!(bus.request().sequence, 2);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let bus = RefreshBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        {
            let hits = hits.clone();
            let _sub = bus.subscribe_infallible(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            });
            bus.request();
        }
        bus.request();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_detach_keeps_listener() {
        let bus = RefreshBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        bus.subscribe_infallible(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .detach();
        bus.request();
        bus.request();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn test_unsubscribe_is_idempotent_per_handle() {
        let bus = RefreshBus::new();
        let sub = bus.subscribe(|_| Ok(()));
        assert!(sub.is_active());
        assert!(sub.unsubscribe());
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_handle_outliving_bus_is_harmless() {
        let bus = RefreshBus::new();
        let sub = bus.subscribe(|_| Ok(()));
        drop(bus);
        assert!(!sub.is_active());
        assert!(!sub.unsubscribe());
    }

    #[test]
    fn test_panicking_listener_reported() {
        let faults = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink_faults = faults.clone();
        let bus = RefreshBus::with_error_sink(move |fault: &ListenerFault| {
            sink_faults.lock().push(fault.clone());
        });
        let _sub = bus.subscribe(|_| panic!("cache poisoned"));
        let report = bus.request();
        assert_eq!(report.failed, 1);
        let faults = faults.lock();
        assert_eq!(
            faults[0].error,
            ListenerError::Panicked("cache poisoned".to_string())
        );
    }
}
