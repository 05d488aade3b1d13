//! Broadcast behaviour of the refresh bus as seen by producers and listeners.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use parking_lot::Mutex;
use weft_refresh::{ListenerError, ListenerFault, RefreshBus, Subscription};
use weft_testkit::{init_tracing, CallLog};

fn logging_listener(bus: &RefreshBus, log: &CallLog, label: &'static str) -> Subscription {
    let log = log.clone();
    bus.subscribe_infallible(move |_| log.push(label))
}

fn collecting_bus() -> (RefreshBus, Arc<Mutex<Vec<ListenerFault>>>) {
    let faults = Arc::new(Mutex::new(Vec::new()));
    let sink = faults.clone();
    let bus = RefreshBus::with_error_sink(move |fault: &ListenerFault| {
        sink.lock().push(fault.clone());
    });
    (bus, faults)
}

#[test]
fn test_every_listener_runs_once_in_subscription_order() {
    init_tracing();
    let bus = RefreshBus::new();
    let log = CallLog::new();
    let _a = logging_listener(&bus, &log, "contacts");
    let _b = logging_listener(&bus, &log, "channels");
    let _c = logging_listener(&bus, &log, "invitations");

    let report = bus.request();

    assert_eq!(log.entries(), vec!["contacts", "channels", "invitations"]);
    assert_eq!(report.delivered, 3);
    assert!(report.is_clean());
}

#[test]
fn test_unsubscribed_listener_misses_later_requests() {
    let bus = RefreshBus::new();
    let log = CallLog::new();
    let l1 = logging_listener(&bus, &log, "L1");
    let _l2 = logging_listener(&bus, &log, "L2");

    bus.request();
    assert_eq!(log.entries(), vec!["L1", "L2"]);

    assert!(l1.unsubscribe());
    log.clear();
    bus.request();
    assert_eq!(log.entries(), vec!["L2"]);
}

#[test]
fn test_request_without_listeners_is_a_no_op() {
    let bus = RefreshBus::new();
    let report = bus.request();
    assert_eq!(report.invoked(), 0);
    assert_eq!(bus.subscriber_count(), 0);
}

#[test]
fn test_completion_runs_after_every_listener() {
    let bus = RefreshBus::new();
    let log = CallLog::new();
    let _a = logging_listener(&bus, &log, "first");
    let _b = logging_listener(&bus, &log, "second");

    let done = log.clone();
    let report = bus.request_with(move |report| {
        done.push(format!("done:{}", report.delivered));
    });

    assert_eq!(log.entries(), vec!["first", "second", "done:2"]);
    assert_eq!(report.sequence, 1);
}

#[test]
fn test_completion_runs_with_no_listeners() {
    let bus = RefreshBus::new();
    let log = CallLog::new();
    let done = log.clone();
    bus.request_with(move |_| done.push("done"));
    assert_eq!(log.entries(), vec!["done"]);
}

#[test]
fn test_failing_listener_does_not_stop_delivery() {
    let (bus, faults) = collecting_bus();
    let log = CallLog::new();
    let _a = logging_listener(&bus, &log, "before");
    let broken = bus.subscribe(|_| Err(ListenerError::failed("backend offline")));
    let _c = logging_listener(&bus, &log, "after");

    let report = bus.request();

    assert_eq!(log.entries(), vec!["before", "after"]);
    assert_eq!(report.delivered, 2);
    assert_eq!(report.failed, 1);
    let faults = faults.lock();
    assert_eq!(faults.len(), 1);
    assert_eq!(faults[0].listener, broken.id());
    assert_eq!(faults[0].sequence, report.sequence);
    assert_eq!(faults[0].error, ListenerError::failed("backend offline"));
}

#[test]
fn test_panicking_listener_does_not_stop_delivery() {
    let (bus, faults) = collecting_bus();
    let log = CallLog::new();
    let _a = bus.subscribe_infallible(|_| panic!("listener bug"));
    let _b = logging_listener(&bus, &log, "survivor");

    let report = bus.request();

    assert_eq!(log.entries(), vec!["survivor"]);
    assert_eq!(report.failed, 1);
    assert!(matches!(faults.lock()[0].error, ListenerError::Panicked(_)));

    // the bus stays usable afterwards
    log.clear();
    bus.request();
    assert_eq!(log.entries(), vec!["survivor"]);
}

#[test]
fn test_listener_subscribed_during_broadcast_waits_for_next_request() {
    let bus = RefreshBus::new();
    let log = CallLog::new();
    let late: Arc<Mutex<Vec<Subscription>>> = Arc::new(Mutex::new(Vec::new()));

    let inner_bus = bus.clone();
    let inner_log = log.clone();
    let holder = late.clone();
    let _spawner = bus.subscribe_infallible(move |event| {
        inner_log.push(format!("spawner:{}", event.sequence()));
        if event.sequence() == 1 {
            let log = inner_log.clone();
            let sub = inner_bus.subscribe_infallible(move |event| {
                log.push(format!("late:{}", event.sequence()));
            });
            holder.lock().push(sub);
        }
    });

    bus.request();
    assert_eq!(log.entries(), vec!["spawner:1"]);

    bus.request();
    assert_eq!(log.entries(), vec!["spawner:1", "spawner:2", "late:2"]);
}

#[test]
fn test_listener_removed_mid_broadcast_is_skipped() {
    let bus = RefreshBus::new();
    let log = CallLog::new();
    let victim: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

    let slot = victim.clone();
    let remover_log = log.clone();
    let _remover = bus.subscribe_infallible(move |_| {
        remover_log.push("remover");
        if let Some(sub) = slot.lock().take() {
            sub.unsubscribe();
        }
    });
    *victim.lock() = Some(logging_listener(&bus, &log, "victim"));
    let _tail = logging_listener(&bus, &log, "tail");

    let report = bus.request();

    assert_eq!(log.entries(), vec!["remover", "tail"]);
    assert_eq!(report.delivered, 2);
    assert_eq!(bus.subscriber_count(), 2);
}

#[test]
fn test_listener_may_unsubscribe_itself() {
    let bus = RefreshBus::new();
    let log = CallLog::new();
    let own: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

    let slot = own.clone();
    let once_log = log.clone();
    let sub = bus.subscribe_infallible(move |_| {
        once_log.push("once");
        slot.lock().take();
    });
    *own.lock() = Some(sub);

    bus.request();
    bus.request();

    assert_eq!(log.entries(), vec!["once"]);
    assert_eq!(bus.subscriber_count(), 0);
}

#[test]
fn test_clones_share_subscribers() {
    let bus = RefreshBus::new();
    let producer = bus.clone();
    let log = CallLog::new();
    let _sub = logging_listener(&bus, &log, "owner");

    producer.request();

    assert_eq!(log.count("owner"), 1);
    assert_eq!(producer.subscriber_count(), 1);
}

#[test]
fn test_replacing_error_sink() {
    let bus = RefreshBus::new();
    let _broken = bus.subscribe(|_| Err(ListenerError::failed("nope")));
    bus.request();

    let seen = CallLog::new();
    let sink_log = seen.clone();
    bus.set_error_sink(move |fault: &ListenerFault| sink_log.push(fault.error.to_string()));
    bus.request();

    assert_eq!(seen.entries(), vec!["listener failed: nope"]);
}
