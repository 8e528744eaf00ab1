//! # Event subscribers.
//!
//! Subscribers observe controller [`Event`](crate::Event)s published on the bus.
//!
//! ```text
//! Controller ── publish(Event) ──► Bus ──► bus listener ──► SubscriberSet::emit
//!                                                             ├──► LogWriter
//!                                                             ├──► CallbackNotifier (if configured)
//!                                                             └──► custom ...
//! ```
//!
//! - [`Subscribe`] extension trait
//! - [`SubscriberSet`] non-blocking fan-out with per-subscriber queues
//! - [`LogWriter`] renders events through `tracing`

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
