//! Pluggable schema validation
//!
//! The form controller never knows how a schema is described. It only talks
//! to a [`SchemaValidator`], which either accepts a candidate (returning the
//! normalized value) or refuses it with a [`SchemaError`].
//!
//! Most validators are synchronous. The built-in ones ([`Schema`](crate::Schema),
//! [`FnValidator`], [`AcceptAll`]) implement both traits; any other
//! [`SyncValidator`] is lifted with [`SyncValidator::into_async`].

use async_trait::async_trait;
use std::sync::Arc;

use crate::errors::SchemaError;

/// Result of validating a candidate value.
pub type ValidationResult<T> = Result<T, SchemaError>;

/// Asynchronous validator contract consumed by the form controller.
///
/// Implementations must be pure with respect to the candidate: calling
/// `validate` twice with the same value yields the same outcome.
#[async_trait]
pub trait SchemaValidator<T>: Send + Sync
where
    T: Send + Sync,
{
    /// Judge `candidate`, returning the normalized value on acceptance.
    async fn validate(&self, candidate: &T) -> ValidationResult<T>;
}

/// Synchronous validator.
pub trait SyncValidator<T>: Send + Sync {
    /// Judge `candidate`, returning the normalized value on acceptance.
    fn validate_sync(&self, candidate: &T) -> ValidationResult<T>;

    /// Wrap `self` so it can be handed to anything expecting a
    /// [`SchemaValidator`].
    fn into_async(self) -> SyncAdapter<Self>
    where
        Self: Sized,
    {
        SyncAdapter(self)
    }
}

/// [`SchemaValidator`] over a [`SyncValidator`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SyncAdapter<V>(pub V);

#[async_trait]
impl<T, V> SchemaValidator<T> for SyncAdapter<V>
where
    T: Send + Sync,
    V: SyncValidator<T>,
{
    async fn validate(&self, candidate: &T) -> ValidationResult<T> {
        self.0.validate_sync(candidate)
    }
}

/// Shared, type-erased validator handle.
pub type BoxedValidator<T> = Arc<dyn SchemaValidator<T>>;

/// Validator backed by a closure.
#[derive(Clone)]
pub struct FnValidator<F> {
    check: F,
}

impl<F> std::fmt::Debug for FnValidator<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnValidator").finish_non_exhaustive()
    }
}

impl<T, F> SyncValidator<T> for FnValidator<F>
where
    F: Fn(&T) -> ValidationResult<T> + Send + Sync,
{
    fn validate_sync(&self, candidate: &T) -> ValidationResult<T> {
        (self.check)(candidate)
    }
}

#[async_trait]
impl<T, F> SchemaValidator<T> for FnValidator<F>
where
    T: Send + Sync,
    F: Fn(&T) -> ValidationResult<T> + Send + Sync,
{
    async fn validate(&self, candidate: &T) -> ValidationResult<T> {
        (self.check)(candidate)
    }
}

/// Wrap a closure as a validator.
///
/// ```rust,ignore
/// let positive = validator_fn(|n: &i32| {
///     if *n > 0 { Ok(*n) } else { Err(FieldErrors::root("must be positive").into()) }
/// });
/// ```
pub fn validator_fn<T, F>(check: F) -> FnValidator<F>
where
    F: Fn(&T) -> ValidationResult<T> + Send + Sync,
{
    FnValidator { check }
}

/// Validator that accepts every value unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAll;

impl<T: Clone> SyncValidator<T> for AcceptAll {
    fn validate_sync(&self, candidate: &T) -> ValidationResult<T> {
        Ok(candidate.clone())
    }
}

#[async_trait]
impl<T> SchemaValidator<T> for AcceptAll
where
    T: Clone + Send + Sync,
{
    async fn validate(&self, candidate: &T) -> ValidationResult<T> {
        Ok(candidate.clone())
    }
}
