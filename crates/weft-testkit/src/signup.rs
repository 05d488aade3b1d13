//! Reference signup form used across the test suites.

use serde::{Deserialize, Serialize};
use weft_core::Schema;

/// Message for a missing email.
pub const EMAIL_REQUIRED: &str = "required";

/// Message for an under-age applicant.
pub const AGE_TOO_YOUNG: &str = "must be ≥ 18";

/// Lowest accepted age.
pub const MINIMUM_AGE: u32 = 18;

/// Signup form values.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signup {
    /// Contact address
    pub email: String,
    /// Applicant age in years
    pub age: u32,
}

impl Signup {
    /// Build a signup value.
    pub fn new(email: impl Into<String>, age: u32) -> Self {
        Self {
            email: email.into(),
            age,
        }
    }
}

/// `email` must be non-empty and `age` at least [`MINIMUM_AGE`].
pub fn signup_schema() -> Schema<Signup> {
    Schema::new()
        .ensure("email", EMAIL_REQUIRED, |s: &Signup| !s.email.is_empty())
        .ensure("age", AGE_TOO_YOUNG, |s: &Signup| s.age >= MINIMUM_AGE)
}
