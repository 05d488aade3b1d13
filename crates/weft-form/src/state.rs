//! Observable form state
//!
//! [`FormState`] is what the rendering layer reads: the live values, the
//! errors of the last applied validation pass, and interaction metadata.
//! It contains no behavior beyond derived queries; all transitions are made
//! by the controller.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

use weft_core::{FieldErrors, FieldPath};

/// Snapshot of one form instance.
///
/// `errors` reflects the most recent applied validation pass (plus any
/// externally set errors), not necessarily the live `values`. `is_valid` is
/// kept equal to `errors.is_empty()`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FormState<T> {
    /// Current values
    pub values: T,
    /// Values the form was created or last reset with
    pub default_values: T,
    /// Messages keyed by field path
    pub errors: FieldErrors,
    /// Fields the user has blurred at least once
    pub touched: BTreeSet<FieldPath>,
    /// Fields whose value differs from the defaults
    pub dirty: BTreeSet<FieldPath>,
    /// Fields past their first validation
    pub validated: BTreeSet<FieldPath>,
    /// A submit handler is running
    pub is_submitting: bool,
    /// At least one submit was attempted since the last reset
    pub is_submitted: bool,
    /// A validation call is in flight
    pub is_validating: bool,
    /// True iff `errors` is empty
    pub is_valid: bool,
    /// Number of submit attempts since the last reset
    pub submit_count: u32,
}

impl<T: Clone> FormState<T> {
    /// Fresh state with `values` as both current and default values.
    pub fn new(values: T) -> Self {
        Self {
            default_values: values.clone(),
            values,
            errors: FieldErrors::new(),
            touched: BTreeSet::new(),
            dirty: BTreeSet::new(),
            validated: BTreeSet::new(),
            is_submitting: false,
            is_submitted: false,
            is_validating: false,
            is_valid: true,
            submit_count: 0,
        }
    }
}

impl<T> FormState<T> {
    /// Replace the error map and keep `is_valid` in step.
    pub(crate) fn set_errors(&mut self, errors: FieldErrors) {
        self.errors = errors;
        self.is_valid = self.errors.is_empty();
    }

    /// Whether `path` (or one of its ancestors) has been validated, or the
    /// form has been submitted.
    #[must_use]
    pub fn is_validated(&self, path: &FieldPath) -> bool {
        self.is_submitted || self.validated.iter().any(|v| path.is_within(v))
    }

    /// Whether any field differs from the defaults.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Whether `path` has been touched.
    #[must_use]
    pub fn is_touched(&self, path: &str) -> bool {
        self.touched.contains(path)
    }

    /// Message for exactly `path`.
    #[must_use]
    pub fn error(&self, path: &str) -> Option<&str> {
        self.errors.get(path)
    }

    /// Message for `path`, but only once the user has touched the field or
    /// tried to submit; before that the rendering layer should stay quiet.
    #[must_use]
    pub fn visible_error(&self, path: &str) -> Option<&str> {
        if self.is_submitted || self.is_touched(path) {
            self.error(path)
        } else {
            None
        }
    }
}

/// Per-field view for renderers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldState {
    /// Current value at the path, if present
    pub value: Option<Value>,
    /// Message for the path
    pub error: Option<String>,
    /// Field has been blurred
    pub is_touched: bool,
    /// Field differs from its default
    pub is_dirty: bool,
    /// Field is past its first validation
    pub is_validated: bool,
}
