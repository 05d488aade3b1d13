//! Controller configuration
//!
//! [`FormOptions`] carries the initial values and the two trigger policies.
//! Options deserialize with per-field defaults, so partial configuration
//! (TOML or JSON) merges over the controller's defaults:
//!
//! ```toml
//! validation_trigger = "on_change"
//! ```
//!
//! The validator is deliberately not an option: it is passed to the
//! controller constructor and cannot be replaced through configuration.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::FormError;

/// UI event that causes (re)validation to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationTrigger {
    /// When the field loses focus
    OnBlur,
    /// On every edit
    OnChange,
    /// Only when the form is submitted
    OnSubmit,
}

impl ValidationTrigger {
    /// Short label for logs and diagnostics.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::OnBlur => "on_blur",
            Self::OnChange => "on_change",
            Self::OnSubmit => "on_submit",
        }
    }
}

impl fmt::Display for ValidationTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Default trigger for a field's first validation.
pub const DEFAULT_VALIDATION_TRIGGER: ValidationTrigger = ValidationTrigger::OnBlur;

/// Default trigger for re-checking a field that was already validated.
pub const DEFAULT_REVALIDATION_TRIGGER: ValidationTrigger = ValidationTrigger::OnChange;

/// Form controller options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormOptions<T> {
    /// Initial values; `T::default()` when absent
    pub default_values: Option<T>,
    /// When a field first becomes validated
    pub validation_trigger: ValidationTrigger,
    /// When an already validated field is re-checked after edits
    pub revalidation_trigger: ValidationTrigger,
}

impl<T> Default for FormOptions<T> {
    fn default() -> Self {
        Self {
            default_values: None,
            validation_trigger: DEFAULT_VALIDATION_TRIGGER,
            revalidation_trigger: DEFAULT_REVALIDATION_TRIGGER,
        }
    }
}

impl<T> FormOptions<T> {
    /// Set the initial values.
    #[must_use]
    pub fn with_default_values(mut self, values: T) -> Self {
        self.default_values = Some(values);
        self
    }

    /// Set the first-validation trigger.
    #[must_use]
    pub fn with_validation_trigger(mut self, trigger: ValidationTrigger) -> Self {
        self.validation_trigger = trigger;
        self
    }

    /// Set the revalidation trigger.
    #[must_use]
    pub fn with_revalidation_trigger(mut self, trigger: ValidationTrigger) -> Self {
        self.revalidation_trigger = trigger;
        self
    }

    /// Apply caller overrides; every field that is set wins.
    #[must_use]
    pub fn merge(mut self, overrides: FormOptionsOverride<T>) -> Self {
        if let Some(values) = overrides.default_values {
            self.default_values = Some(values);
        }
        if let Some(trigger) = overrides.validation_trigger {
            self.validation_trigger = trigger;
        }
        if let Some(trigger) = overrides.revalidation_trigger {
            self.revalidation_trigger = trigger;
        }
        self
    }
}

impl<T: DeserializeOwned> FormOptions<T> {
    /// Parse options from TOML, filling missing fields with defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, FormError> {
        toml::from_str(source).map_err(|e| FormError::Options(e.to_string()))
    }

    /// Parse options from JSON, filling missing fields with defaults.
    pub fn from_json_str(source: &str) -> Result<Self, FormError> {
        serde_json::from_str(source).map_err(|e| FormError::Options(e.to_string()))
    }
}

/// Partial options supplied by a caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormOptionsOverride<T> {
    /// Replacement initial values
    pub default_values: Option<T>,
    /// Replacement first-validation trigger
    pub validation_trigger: Option<ValidationTrigger>,
    /// Replacement revalidation trigger
    pub revalidation_trigger: Option<ValidationTrigger>,
}

impl<T> Default for FormOptionsOverride<T> {
    fn default() -> Self {
        Self {
            default_values: None,
            validation_trigger: None,
            revalidation_trigger: None,
        }
    }
}
