//! Form controller errors

use thiserror::Error;
use weft_core::{ErrorCategory, FieldErrors, FieldPath};

/// Errors from addressing or editing form values.
#[derive(Debug, Error)]
pub enum FormError {
    /// The path does not address a field of the value
    #[error("field path `{path}` is not addressable: {reason}")]
    InvalidPath {
        /// Offending path
        path: FieldPath,
        /// What went wrong while walking it
        reason: String,
    },
    /// The written value does not fit the form's value type
    #[error("value written to `{path}` does not fit the form: {source}")]
    IncompatibleValue {
        /// Path that was written
        path: FieldPath,
        /// Deserialization failure
        #[source]
        source: serde_json::Error,
    },
    /// The form values could not be serialized
    #[error("form values could not be serialized: {0}")]
    Serialize(#[source] serde_json::Error),
    /// Options could not be parsed
    #[error("invalid form options: {0}")]
    Options(String),
}

impl FormError {
    pub(crate) fn invalid_path(path: &FieldPath, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.clone(),
            reason: reason.into(),
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidPath { .. } | Self::IncompatibleValue { .. } => ErrorCategory::Input,
            Self::Serialize(_) | Self::Options(_) => ErrorCategory::Operation,
        }
    }
}

/// Why `submit` did not complete.
#[derive(Debug, Error)]
pub enum SubmitError<E> {
    /// Validation rejected the values; the handler was not called
    #[error("form is invalid: {0}")]
    Invalid(FieldErrors),
    /// Another submit is still running
    #[error("a submit is already in progress")]
    AlreadySubmitting,
    /// The handler ran and failed
    #[error("submit handler failed: {0}")]
    Handler(#[source] E),
}

impl<E> SubmitError<E> {
    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Invalid(_) => ErrorCategory::Input,
            Self::AlreadySubmitting => ErrorCategory::State,
            Self::Handler(_) => ErrorCategory::Operation,
        }
    }

    /// Field errors, when the submit was refused by validation.
    #[must_use]
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Invalid(errors) => Some(errors),
            _ => None,
        }
    }
}
