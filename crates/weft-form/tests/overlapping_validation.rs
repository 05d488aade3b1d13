//! Overlapping asynchronous validations: only the newest pass may land.

#![allow(clippy::unwrap_used)]

use futures::{join, FutureExt};
use weft_form::{FormController, FormOptions, ValidationTrigger};
use weft_testkit::{init_tracing, signup_schema, GateControl, GatedValidator, Signup, AGE_TOO_YOUNG};

fn gated_form(options: FormOptions<Signup>) -> (FormController<Signup>, GateControl) {
    init_tracing();
    let (validator, gate) = GatedValidator::new(signup_schema());
    (FormController::new(validator, options), gate)
}

fn validate_on_change() -> FormOptions<Signup> {
    FormOptions::default()
        .with_default_values(Signup::new("a@b.com", 0))
        .with_validation_trigger(ValidationTrigger::OnChange)
}

#[tokio::test]
async fn late_first_result_is_discarded() {
    let (form, gate) = gated_form(validate_on_change());

    let first = form.set_value("age", 15);
    let second = async {
        form.set_value("age", 20).await.unwrap();
        // The second pass has landed; now let the first one finish late.
        gate.release(0);
    };
    let release_second = async { gate.release(1) };

    let (first, (), ()) = join!(first, second, release_second);
    first.unwrap();

    let state = form.state();
    assert_eq!(gate.calls(), 2);
    assert_eq!(state.values.age, 20);
    assert!(state.errors.is_empty(), "stale errors leaked: {}", state.errors);
    assert!(state.is_valid);
    assert!(!state.is_validating);
}

#[tokio::test]
async fn in_order_results_keep_only_the_newest() {
    let (form, gate) = gated_form(validate_on_change());

    let first = form.set_value("age", 20);
    let second = form.set_value("age", 15);
    let release = async {
        gate.release(0);
        gate.release(1);
    };

    let (first, second, ()) = join!(first, second, release);
    first.unwrap();
    second.unwrap();

    let errors = form.errors();
    assert_eq!(errors.get("age"), Some(AGE_TOO_YOUNG));
    assert_eq!(errors.len(), 1);
}

#[tokio::test]
async fn abandoned_validation_does_not_leave_form_validating() {
    let (form, gate) = gated_form(validate_on_change());

    // polled once, parked at the gate, then dropped
    let abandoned = form.set_value("age", 20).now_or_never();
    assert!(abandoned.is_none());

    let state = form.state();
    assert_eq!(gate.calls(), 1);
    assert_eq!(state.values.age, 20);
    assert!(!state.is_validating);

    gate.release(1);
    form.set_value("age", 15).await.unwrap();
    let state = form.state();
    assert_eq!(state.errors.get("age"), Some(AGE_TOO_YOUNG));
    assert!(!state.is_validating);
}

#[tokio::test]
async fn abandoning_an_older_pass_keeps_newer_one_validating() {
    let (form, gate) = gated_form(validate_on_change());

    let mut older = Box::pin(form.set_value("age", 20));
    assert!(older.as_mut().now_or_never().is_none());
    let mut newer = Box::pin(form.set_value("age", 15));
    assert!(newer.as_mut().now_or_never().is_none());

    drop(older);
    assert!(form.state().is_validating);

    gate.release(1);
    newer.await.unwrap();
    let state = form.state();
    assert!(!state.is_validating);
    assert_eq!(state.errors.get("age"), Some(AGE_TOO_YOUNG));
}

#[tokio::test]
async fn reset_discards_in_flight_validation() {
    let (form, gate) = gated_form(validate_on_change());

    let pending = form.set_value("age", 3);
    let reset = async {
        form.reset();
        gate.release(0);
    };
    let (pending, ()) = join!(pending, reset);
    pending.unwrap();

    let state = form.state();
    assert_eq!(state.values.age, 0);
    assert!(state.errors.is_empty());
    assert!(state.validated.is_empty());
    assert!(!state.is_validating);
}

#[tokio::test]
async fn submit_uses_its_own_result_even_when_superseded() {
    let (form, gate) = gated_form(
        FormOptions::default()
            .with_default_values(Signup::new("a@b.com", 30))
            .with_validation_trigger(ValidationTrigger::OnChange),
    );

    let submit = form.submit(|signup| async move { Ok::<u32, std::io::Error>(signup.age) });
    let edit = async {
        form.set_value("age", 2).await.unwrap();
        gate.release(0);
    };
    let release_edit = async { gate.release(1) };

    let (submitted, (), ()) = join!(submit, edit, release_edit);

    assert_eq!(submitted.unwrap(), 30);
    assert_eq!(form.errors().get("age"), Some(AGE_TOO_YOUNG));
    assert!(!form.is_submitting());
}
