//! # Weft Core
//!
//! Shared vocabulary for the Weft UI-state layer:
//! - [`FieldPath`]: dotted addresses of fields inside a form value
//! - [`FieldErrors`], [`SchemaError`], [`ValidatorFault`]: validation outcomes
//! - [`SchemaValidator`] / [`SyncValidator`]: the pluggable validation strategy
//! - [`Schema`]: a built-in declarative rule list implementing the strategy
//!
//! This crate is pure: no runtime, no I/O, no global state.

pub mod errors;
pub mod path;
pub mod schema;
pub mod validator;

pub use errors::{ErrorCategory, FieldErrors, SchemaError, ValidatorFault};
pub use path::{FieldPath, ROOT_PATH};
pub use schema::Schema;
pub use validator::{
    validator_fn, AcceptAll, BoxedValidator, FnValidator, SchemaValidator, SyncAdapter,
    SyncValidator, ValidationResult,
};
