//! Validation error types
//!
//! Provides the error vocabulary shared by the form controller and validators:
//! - [`FieldErrors`]: per-field messages produced by a rejecting schema
//! - [`ValidatorFault`]: the validator itself failed (not the input)
//! - [`SchemaError`]: what a validator returns instead of an accepted value
//! - [`ErrorCategory`]: coarse classification for frontend treatment

use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::path::FieldPath;

// ============================================================================
// Error Categories
// ============================================================================

/// High-level error categories for frontend error handling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// User input validation errors (correctable by user)
    Input,
    /// The operation was refused because of current state (e.g. double submit)
    State,
    /// Failures of validators, handlers or listeners
    Operation,
}

impl ErrorCategory {
    /// Check if this error category is user-correctable.
    #[must_use]
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, Self::Input)
    }

    /// Get a short label for this category.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Input => "Input",
            Self::State => "State",
            Self::Operation => "Operation",
        }
    }

    /// Get a hint for the user on how to resolve this category of error.
    #[must_use]
    pub fn resolution_hint(&self) -> &'static str {
        match self {
            Self::Input => "Check your input and try again",
            Self::State => "Wait for the current operation to finish",
            Self::Operation => "An unexpected error occurred",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ============================================================================
// Field Errors
// ============================================================================

/// Mapping of field paths to human-readable messages.
///
/// Ordered by path so two maps with the same entries compare and print equal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<FieldPath, String>);

impl FieldErrors {
    /// Create an empty error map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A map holding a single form-level error under [`ROOT_PATH`](crate::ROOT_PATH).
    #[must_use]
    pub fn root(message: impl Into<String>) -> Self {
        Self::new().with(FieldPath::root(), message)
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, path: impl Into<FieldPath>, message: impl Into<String>) -> Self {
        self.insert(path, message);
        self
    }

    /// Set the message for `path`, replacing any previous one.
    pub fn insert(&mut self, path: impl Into<FieldPath>, message: impl Into<String>) {
        self.0.insert(path.into(), message.into());
    }

    /// Set the message for `path` only if it has none yet.
    ///
    /// Returns `true` when the message was recorded.
    pub fn insert_first(&mut self, path: impl Into<FieldPath>, message: impl Into<String>) -> bool {
        match self.0.entry(path.into()) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(message.into());
                true
            }
            btree_map::Entry::Occupied(_) => false,
        }
    }

    /// Message for exactly `path`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&str> {
        self.0.get(path).map(String::as_str)
    }

    /// Form-level message, if any.
    #[must_use]
    pub fn root_message(&self) -> Option<&str> {
        self.get(crate::path::ROOT_PATH)
    }

    /// Whether `path` has a message.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    /// Remove the message for exactly `path`.
    pub fn remove(&mut self, path: &str) -> Option<String> {
        self.0.remove(path)
    }

    /// Remove every message at or below `path`.
    pub fn clear_within(&mut self, path: &FieldPath) {
        self.0.retain(|key, _| !key.is_within(path));
    }

    /// Copy entries from `other`, overwriting on conflict.
    pub fn extend(&mut self, other: FieldErrors) {
        self.0.extend(other.0);
    }

    /// Drop every message.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// True when there are no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate `(path, message)` pairs in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldPath, &str)> {
        self.0.iter().map(|(path, message)| (path, message.as_str()))
    }

    /// Paths that carry a message.
    pub fn paths(&self) -> impl Iterator<Item = &FieldPath> {
        self.0.keys()
    }
}

impl<P, M> FromIterator<(P, M)> for FieldErrors
where
    P: Into<FieldPath>,
    M: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (P, M)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(path, message)| (path.into(), message.into()))
                .collect(),
        )
    }
}

impl IntoIterator for FieldErrors {
    type Item = (FieldPath, String);
    type IntoIter = btree_map::IntoIter<FieldPath, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (path, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{path}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

// ============================================================================
// Validator Errors
// ============================================================================

/// The validator could not judge the input at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidatorFault {
    /// The shape/rules description itself is broken
    #[error("malformed schema: {0}")]
    MalformedSchema(String),
    /// The validator failed while evaluating
    #[error("validator failed: {0}")]
    Internal(String),
}

impl ValidatorFault {
    /// Create an internal fault.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a malformed-schema fault.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedSchema(message.into())
    }

    /// Surface the fault as a single form-level error entry.
    #[must_use]
    pub fn into_field_errors(self) -> FieldErrors {
        FieldErrors::root(self.to_string())
    }
}

/// Why a validator did not accept a candidate value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The candidate was judged and rejected
    #[error("invalid input: {0}")]
    Invalid(FieldErrors),
    /// The validator failed
    #[error(transparent)]
    Fault(#[from] ValidatorFault),
}

impl SchemaError {
    /// Rejection with the given field errors.
    #[must_use]
    pub fn invalid(errors: FieldErrors) -> Self {
        Self::Invalid(errors)
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Invalid(_) => ErrorCategory::Input,
            Self::Fault(_) => ErrorCategory::Operation,
        }
    }

    /// Flatten into the error map the form should display.
    #[must_use]
    pub fn into_field_errors(self) -> FieldErrors {
        match self {
            Self::Invalid(errors) => errors,
            Self::Fault(fault) => fault.into_field_errors(),
        }
    }
}

impl From<FieldErrors> for SchemaError {
    fn from(errors: FieldErrors) -> Self {
        Self::Invalid(errors)
    }
}
