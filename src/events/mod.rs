//! Controller events: types and broadcast bus.
//!
//! The controller, its supervising routines and the subscriber workers publish
//! lifecycle events on a [`Bus`]; one listener fans them out to the
//! [`SubscriberSet`](crate::SubscriberSet).
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Controller` (submit/cancel/admission/shutdown),
//!   supervising routines (`WorkerExited`), `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the controller's bus listener, which feeds every subscriber
//!   (including the callback notifier).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
