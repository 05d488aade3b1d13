//! Property test strategies for Weft form values

use proptest::prelude::*;

// Re-export proptest for convenience
pub use proptest;

use crate::signup::Signup;

/// Strategy for signup values, valid and invalid alike.
///
/// Emails are empty about a quarter of the time; ages straddle the minimum.
pub fn arb_signup() -> impl Strategy<Value = Signup> {
    (
        prop_oneof![1 => Just(String::new()), 3 => "[a-z]{1,8}@[a-z]{1,8}\\.com"],
        0u32..40,
    )
        .prop_map(|(email, age)| Signup { email, age })
}
