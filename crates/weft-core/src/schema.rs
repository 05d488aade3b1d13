//! Declarative rule-list schemas
//!
//! [`Schema`] is a small built-in way to describe accepted values without an
//! external schema library: an ordered list of per-field checks plus an
//! optional normalization step. Only the first failing rule of each field is
//! reported, and normalization only runs once every rule passes.

use async_trait::async_trait;
use std::fmt;
use tracing::trace;

use crate::errors::{FieldErrors, SchemaError};
use crate::path::FieldPath;
use crate::validator::{SchemaValidator, SyncValidator, ValidationResult};

type Check<T> = Box<dyn Fn(&T) -> Result<(), String> + Send + Sync>;
type Normalize<T> = Box<dyn Fn(&T) -> T + Send + Sync>;

struct Rule<T> {
    path: FieldPath,
    check: Check<T>,
}

/// Ordered set of field rules for values of type `T`.
pub struct Schema<T> {
    rules: Vec<Rule<T>>,
    normalize: Option<Normalize<T>>,
}

impl<T> Default for Schema<T> {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            normalize: None,
        }
    }
}

impl<T> fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let paths: Vec<_> = self.rules.iter().map(|r| r.path.as_str()).collect();
        f.debug_struct("Schema")
            .field("rules", &paths)
            .field("normalizes", &self.normalize.is_some())
            .finish()
    }
}

impl<T> Schema<T> {
    /// Create an empty schema (accepts everything).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule for `path`. The check returns the message on failure.
    #[must_use]
    pub fn rule<F>(mut self, path: impl Into<FieldPath>, check: F) -> Self
    where
        F: Fn(&T) -> Result<(), String> + Send + Sync + 'static,
    {
        self.rules.push(Rule {
            path: path.into(),
            check: Box::new(check),
        });
        self
    }

    /// Add a rule that fails with `message` whenever `predicate` is false.
    #[must_use]
    pub fn ensure<F>(self, path: impl Into<FieldPath>, message: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let message = message.into();
        self.rule(path, move |value| {
            if predicate(value) {
                Ok(())
            } else {
                Err(message.clone())
            }
        })
    }

    /// Transform accepted values before they are handed back.
    #[must_use]
    pub fn normalize<F>(mut self, normalize: F) -> Self
    where
        F: Fn(&T) -> T + Send + Sync + 'static,
    {
        self.normalize = Some(Box::new(normalize));
        self
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the schema has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every rule and collect the first message per field.
    pub fn check(&self, candidate: &T) -> FieldErrors {
        let mut errors = FieldErrors::new();
        for rule in &self.rules {
            if errors.contains(rule.path.as_str()) {
                continue;
            }
            if let Err(message) = (rule.check)(candidate) {
                trace!(path = %rule.path, %message, "schema rule failed");
                errors.insert(rule.path.clone(), message);
            }
        }
        errors
    }
}

impl<T> SyncValidator<T> for Schema<T>
where
    T: Clone + Send + Sync,
{
    fn validate_sync(&self, candidate: &T) -> ValidationResult<T> {
        let errors = self.check(candidate);
        if !errors.is_empty() {
            return Err(SchemaError::Invalid(errors));
        }
        Ok(match &self.normalize {
            Some(normalize) => normalize(candidate),
            None => candidate.clone(),
        })
    }
}

#[async_trait]
impl<T> SchemaValidator<T> for Schema<T>
where
    T: Clone + Send + Sync,
{
    async fn validate(&self, candidate: &T) -> ValidationResult<T> {
        self.validate_sync(candidate)
    }
}
