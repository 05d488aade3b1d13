//! Weft Testing Infrastructure
//!
//! Common fixtures shared by the Weft crates' tests: a reference signup
//! schema, a validator whose calls can be held and released out of order,
//! a call log for observing listener order, and proptest strategies.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! weft-testkit = { workspace = true }
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod call_log;
pub mod gate;
pub mod signup;
pub mod strategies;

pub use call_log::CallLog;
pub use gate::{GateControl, GatedValidator};
pub use signup::{signup_schema, Signup, AGE_TOO_YOUNG, EMAIL_REQUIRED, MINIMUM_AGE};

/// Install a test subscriber honouring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
