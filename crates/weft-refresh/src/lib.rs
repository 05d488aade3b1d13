//! # Weft Refresh
//!
//! A decoupled "please reload" signal. Producers call
//! [`RefreshBus::request`] after something changed; every data owner that
//! subscribed re-runs its own loading logic. Producers never hold references
//! to consumers and the bus never filters by topic.

pub mod bus;
pub mod errors;
pub mod event;

pub use bus::{RefreshBus, Subscription};
pub use errors::{
    ErrorSink, ListenerError, ListenerFault, ListenerId, ListenerResult, TracingSink,
};
pub use event::{Completion, DeliveryReport, RefreshEvent};
