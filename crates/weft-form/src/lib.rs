//! # Weft Form
//!
//! Schema-bound form state controller.
//!
//! A [`FormController`] wraps a structured value `T` with a pluggable
//! [`SchemaValidator`](weft_core::SchemaValidator), tracks per-field
//! interaction metadata (touched, dirty, validated), and runs validation at
//! the points configured in [`FormOptions`]. The rendering layer reads
//! [`FormState`] snapshots (or subscribes through
//! [`FormController::state_signal`]) and calls `set_value`, `blur` and
//! `submit`.

pub mod controller;
pub mod errors;
pub mod options;
pub mod state;
pub mod value;

pub use controller::{FormController, FormValues};
pub use errors::{FormError, SubmitError};
pub use options::{
    FormOptions, FormOptionsOverride, ValidationTrigger, DEFAULT_REVALIDATION_TRIGGER,
    DEFAULT_VALIDATION_TRIGGER,
};
pub use state::{FieldState, FormState};
pub use value::{read_path, write_path};

pub use weft_core::{FieldErrors, FieldPath, SchemaError, SchemaValidator, ValidatorFault};
