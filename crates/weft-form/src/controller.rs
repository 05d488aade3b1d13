//! # Form State Controller
//!
//! [`FormController`] owns the state of one form instance and decides when
//! the injected [`SchemaValidator`] runs:
//!
//! - a field that has never been validated is checked on the
//!   `validation_trigger` event (default: blur)
//! - a field past its first validation is re-checked on the
//!   `revalidation_trigger` event (default: change)
//! - `submit` always validates the whole form
//!
//! Validation is holistic: every pass replaces `errors` with the validator's
//! full result.
//!
//! ## Overlapping validations
//!
//! Validators may be asynchronous, so several passes can be in flight at
//! once. Every pass takes a number from a monotonically increasing attempt
//! counter and its result is applied only if no newer pass was issued in the
//! meantime. Stale results are dropped.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let form = FormController::new(signup_schema(), FormOptions::default());
//! form.set_value("email", "a@b.com").await?;
//! form.blur("email").await;
//!
//! match form.submit(|signup| async move { api.register(signup).await }).await {
//!     Ok(receipt) => { /* done */ }
//!     Err(SubmitError::Invalid(errors)) => { /* render errors */ }
//!     Err(e) => { /* handler failed */ }
//! }
//! ```

use futures::FutureExt;
use futures_signals::signal::{Mutable, MutableSignalCloned};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

use weft_core::{
    BoxedValidator, FieldErrors, FieldPath, SchemaError, SchemaValidator, ValidatorFault,
};

use crate::errors::{FormError, SubmitError};
use crate::options::{FormOptions, ValidationTrigger};
use crate::state::{FieldState, FormState};
use crate::value;

/// Convenience trait for form value types
pub trait FormValues: Clone + Default + Serialize + DeserializeOwned + Send + Sync + 'static {}

// Auto-implement for any type that satisfies the bounds
impl<T> FormValues for T where T: Clone + Default + Serialize + DeserializeOwned + Send + Sync + 'static {}

struct ControllerInner<T> {
    validator: BoxedValidator<T>,
    validation_trigger: ValidationTrigger,
    revalidation_trigger: ValidationTrigger,
    state: Mutable<FormState<T>>,
    /// Number of the most recently issued validation pass
    attempts: AtomicU64,
}

/// One finished validation pass.
struct Pass<T> {
    outcome: Result<T, FieldErrors>,
    applied: bool,
}

/// Handle to one form instance. Clones share the same state.
pub struct FormController<T> {
    inner: Arc<ControllerInner<T>>,
}

impl<T> Clone for FormController<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: FormValues> FormController<T> {
    /// Create a controller bound to `validator`.
    pub fn new<V>(validator: V, options: FormOptions<T>) -> Self
    where
        V: SchemaValidator<T> + 'static,
    {
        Self::from_boxed(Arc::new(validator), options)
    }

    /// Create a controller with default options.
    pub fn with_defaults<V>(validator: V) -> Self
    where
        V: SchemaValidator<T> + 'static,
    {
        Self::new(validator, FormOptions::default())
    }

    /// Create a controller from a shared validator handle.
    pub fn from_boxed(validator: BoxedValidator<T>, options: FormOptions<T>) -> Self {
        let FormOptions {
            default_values,
            validation_trigger,
            revalidation_trigger,
        } = options;
        debug!(
            %validation_trigger,
            %revalidation_trigger,
            "form controller created"
        );
        Self {
            inner: Arc::new(ControllerInner {
                validator,
                validation_trigger,
                revalidation_trigger,
                state: Mutable::new(FormState::new(default_values.unwrap_or_default())),
                attempts: AtomicU64::new(0),
            }),
        }
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Snapshot of the whole state.
    pub fn state(&self) -> FormState<T> {
        self.inner.state.get_cloned()
    }

    /// Signal that yields a fresh snapshot whenever the state changes.
    pub fn state_signal(&self) -> MutableSignalCloned<FormState<T>> {
        self.inner.state.signal_cloned()
    }

    /// Current values.
    pub fn values(&self) -> T {
        self.inner.state.lock_ref().values.clone()
    }

    /// Errors of the last applied validation pass.
    pub fn errors(&self) -> FieldErrors {
        self.inner.state.lock_ref().errors.clone()
    }

    /// Whether the error map is empty.
    pub fn is_valid(&self) -> bool {
        self.inner.state.lock_ref().is_valid
    }

    /// Whether a submit handler is running.
    pub fn is_submitting(&self) -> bool {
        self.inner.state.lock_ref().is_submitting
    }

    /// Trigger for first validation of a field.
    pub fn validation_trigger(&self) -> ValidationTrigger {
        self.inner.validation_trigger
    }

    /// Trigger for re-checking validated fields.
    pub fn revalidation_trigger(&self) -> ValidationTrigger {
        self.inner.revalidation_trigger
    }

    /// Value at `path` in the serde data model.
    pub fn get_value(&self, path: impl Into<FieldPath>) -> Result<Option<Value>, FormError> {
        let path = path.into();
        let tree = value::to_tree(&self.inner.state.lock_ref().values)?;
        Ok(value::read_path(&tree, &path).cloned())
    }

    /// Everything a renderer needs to draw one field.
    pub fn field_state(&self, path: impl Into<FieldPath>) -> Result<FieldState, FormError> {
        let path = path.into();
        let state = self.inner.state.lock_ref();
        let tree = value::to_tree(&state.values)?;
        Ok(FieldState {
            value: value::read_path(&tree, &path).cloned(),
            error: state.error(path.as_str()).map(str::to_string),
            is_touched: state.is_touched(path.as_str()),
            is_dirty: state.dirty.contains(path.as_str()),
            is_validated: state.is_validated(&path),
        })
    }

    // ------------------------------------------------------------------
    // Interaction
    // ------------------------------------------------------------------

    /// Write `value` at `path`.
    ///
    /// Validates when the trigger that applies to the field is `OnChange`:
    /// `revalidation_trigger` once the field is past its first validation,
    /// `validation_trigger` before that. Otherwise errors are left as they
    /// are.
    pub async fn set_value<V>(&self, path: impl Into<FieldPath>, new_value: V) -> Result<(), FormError>
    where
        V: Serialize,
    {
        let path = path.into();
        let node = serde_json::to_value(new_value).map_err(FormError::Serialize)?;

        let validate = {
            let mut state = self.inner.state.lock_mut();
            let mut tree = value::to_tree(&state.values)?;
            value::write_path(&mut tree, &path, node)?;
            let defaults = value::to_tree(&state.default_values)?;
            let is_dirty = value::read_path(&tree, &path) != value::read_path(&defaults, &path);
            let values = value::from_tree(tree, &path)?;

            state.values = values;
            mark_dirty(&mut *state, &path, is_dirty);
            self.on_change(&mut *state, &path)
        };

        trace!(path = %path, validate, "field value set");
        if validate {
            self.run_validation("change").await;
        }
        Ok(())
    }

    /// Edit the values through a closure.
    ///
    /// Every top-level field whose serialized value changed is treated as if
    /// it had been written with [`set_value`](Self::set_value).
    pub async fn update<F>(&self, edit: F) -> Result<(), FormError>
    where
        F: FnOnce(&mut T),
    {
        let mut values = self.values();
        let before = value::to_tree(&values)?;
        edit(&mut values);
        let after = value::to_tree(&values)?;
        let changed = value::changed_fields(&before, &after);
        if changed.is_empty() {
            return Ok(());
        }

        let validate = {
            let mut state = self.inner.state.lock_mut();
            let defaults = value::to_tree(&state.default_values)?;
            state.values = values;
            let mut validate = false;
            for path in &changed {
                let is_dirty = value::read_path(&after, path) != value::read_path(&defaults, path);
                mark_dirty(&mut *state, path, is_dirty);
                validate |= self.on_change(&mut *state, path);
            }
            validate
        };

        trace!(changed = changed.len(), validate, "form values updated");
        if validate {
            self.run_validation("change").await;
        }
        Ok(())
    }

    /// Mark `path` touched and validate if the applicable trigger is `OnBlur`.
    pub async fn blur(&self, path: impl Into<FieldPath>) {
        let path = path.into();
        let validate = {
            let mut state = self.inner.state.lock_mut();
            state.touched.insert(path.clone());
            let validate = self.policy_for(&*state, &path) == ValidationTrigger::OnBlur;
            if validate {
                state.validated.insert(path.clone());
            }
            validate
        };

        trace!(path = %path, validate, "field blurred");
        if validate {
            self.run_validation("blur").await;
        }
    }

    /// Validate now, regardless of triggers.
    ///
    /// With a path, that field becomes validated and the result reports
    /// whether it (and anything nested below it) is free of errors. Without
    /// one, every top-level field becomes validated and the result reports
    /// whether the whole form is valid. A validator fault counts as invalid
    /// either way.
    pub async fn trigger(&self, path: Option<FieldPath>) -> Result<bool, FormError> {
        {
            let mut state = self.inner.state.lock_mut();
            match &path {
                Some(path) => {
                    state.validated.insert(path.clone());
                }
                None => {
                    let fields = value::top_level_fields(&value::to_tree(&state.values)?);
                    state.validated.extend(fields);
                }
            }
        }

        let pass = self.run_validation("trigger").await;
        Ok(match (&path, &pass.outcome) {
            (_, Ok(_)) => true,
            (None, Err(_)) => false,
            (Some(path), Err(errors)) => {
                errors.root_message().is_none() && !errors.paths().any(|p| p.is_within(path))
            }
        })
    }

    /// Validate the whole form and, if it is valid, run `handler` with the
    /// accepted (normalized) values.
    ///
    /// `is_submitting` is set while the handler runs and is reset when it
    /// finishes, fails, or the returned future is dropped.
    pub async fn submit<F, Fut, R, E>(&self, handler: F) -> Result<R, SubmitError<E>>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Result<R, E>>,
    {
        {
            let mut state = self.inner.state.lock_mut();
            if state.is_submitting {
                return Err(SubmitError::AlreadySubmitting);
            }
            state.is_submitted = true;
            state.submit_count = state.submit_count.saturating_add(1);
        }

        let pass = self.run_validation("submit").await;
        let accepted = match pass.outcome {
            Ok(accepted) => accepted,
            Err(errors) => {
                debug!(
                    errors = errors.len(),
                    applied = pass.applied,
                    "submit aborted by validation"
                );
                return Err(SubmitError::Invalid(errors));
            }
        };

        let Some(_submitting) = SubmittingGuard::engage(&self.inner.state) else {
            return Err(SubmitError::AlreadySubmitting);
        };
        debug!("submit handler started");
        let result = handler(accepted).await;
        debug!(ok = result.is_ok(), "submit handler finished");
        result.map_err(SubmitError::Handler)
    }

    // ------------------------------------------------------------------
    // External errors and reset
    // ------------------------------------------------------------------

    /// Record an error from outside the validator (e.g. a server response).
    ///
    /// It stays until the next validation pass or [`clear_errors`](Self::clear_errors).
    pub fn set_error(&self, path: impl Into<FieldPath>, message: impl Into<String>) {
        let mut state = self.inner.state.lock_mut();
        let mut errors = state.errors.clone();
        errors.insert(path, message);
        state.set_errors(errors);
    }

    /// Clear errors at and below `path`, or all errors.
    pub fn clear_errors(&self, path: Option<FieldPath>) {
        let mut state = self.inner.state.lock_mut();
        let mut errors = state.errors.clone();
        match path {
            Some(path) => errors.clear_within(&path),
            None => errors.clear(),
        }
        state.set_errors(errors);
    }

    /// Restore the default values and forget all interaction metadata.
    ///
    /// Validations still in flight will not be applied.
    pub fn reset(&self) {
        let defaults = self.inner.state.lock_ref().default_values.clone();
        self.reset_to(defaults);
    }

    /// Like [`reset`](Self::reset), with new default values.
    pub fn reset_to(&self, values: T) {
        let mut state = self.inner.state.lock_mut();
        self.inner.attempts.fetch_add(1, Ordering::AcqRel);
        let submitting = state.is_submitting;
        *state = FormState::new(values);
        state.is_submitting = submitting;
        debug!("form reset");
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn policy_for(&self, state: &FormState<T>, path: &FieldPath) -> ValidationTrigger {
        if state.is_validated(path) {
            self.inner.revalidation_trigger
        } else {
            self.inner.validation_trigger
        }
    }

    /// Decide whether an edit of `path` validates, marking it validated if so.
    fn on_change(&self, state: &mut FormState<T>, path: &FieldPath) -> bool {
        let validate = self.policy_for(state, path) == ValidationTrigger::OnChange;
        if validate {
            state.validated.insert(path.clone());
        }
        validate
    }

    async fn run_validation(&self, reason: &'static str) -> Pass<T> {
        let (attempt, candidate) = {
            let mut state = self.inner.state.lock_mut();
            let attempt = self.inner.attempts.fetch_add(1, Ordering::AcqRel) + 1;
            state.is_validating = true;
            (attempt, state.values.clone())
        };
        debug!(attempt, reason, "validation issued");
        let _pending = ValidatingGuard {
            state: &self.inner.state,
            attempts: &self.inner.attempts,
            attempt,
        };

        let verdict = AssertUnwindSafe(self.inner.validator.validate(&candidate))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(ValidatorFault::internal(panic_message(payload)).into()));
        let outcome = match verdict {
            Ok(accepted) => Ok(accepted),
            Err(SchemaError::Invalid(errors)) => Err(errors),
            Err(SchemaError::Fault(fault)) => {
                warn!(attempt, %fault, "validator fault surfaced as form error");
                Err(fault.into_field_errors())
            }
        };

        let applied = self.apply(attempt, &outcome);
        Pass { outcome, applied }
    }

    fn apply(&self, attempt: u64, outcome: &Result<T, FieldErrors>) -> bool {
        let mut state = self.inner.state.lock_mut();
        let latest = self.inner.attempts.load(Ordering::Acquire);
        if attempt != latest {
            debug!(attempt, latest, "stale validation result discarded");
            return false;
        }
        state.is_validating = false;
        state.set_errors(match outcome {
            Ok(_) => FieldErrors::new(),
            Err(errors) => errors.clone(),
        });
        trace!(attempt, errors = state.errors.len(), "validation applied");
        true
    }
}

fn mark_dirty<T>(state: &mut FormState<T>, path: &FieldPath, is_dirty: bool) {
    if is_dirty {
        state.dirty.insert(path.clone());
    } else {
        state.dirty.remove(path.as_str());
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

/// Clears `is_validating` if a pass ends without being applied (its future
/// was dropped) while it is still the latest attempt.
struct ValidatingGuard<'a, T> {
    state: &'a Mutable<FormState<T>>,
    attempts: &'a AtomicU64,
    attempt: u64,
}

impl<T> Drop for ValidatingGuard<'_, T> {
    fn drop(&mut self) {
        let state = self.state.lock_ref();
        if !state.is_validating || self.attempts.load(Ordering::Acquire) != self.attempt {
            return;
        }
        drop(state);
        let mut state = self.state.lock_mut();
        if self.attempts.load(Ordering::Acquire) == self.attempt {
            state.is_validating = false;
            trace!(attempt = self.attempt, "abandoned validation released");
        }
    }
}

/// Holds `is_submitting` for the lifetime of a submit handler.
struct SubmittingGuard<'a, T> {
    state: &'a Mutable<FormState<T>>,
}

impl<'a, T> SubmittingGuard<'a, T> {
    fn engage(state: &'a Mutable<FormState<T>>) -> Option<Self> {
        {
            let mut current = state.lock_mut();
            if current.is_submitting {
                return None;
            }
            current.is_submitting = true;
        }
        Some(Self { state })
    }
}

impl<T> Drop for SubmittingGuard<'_, T> {
    fn drop(&mut self) {
        self.state.lock_mut().is_submitting = false;
    }
}
