//! # Best-effort start/end notifications.
//!
//! When a worker starts or terminates, the controller publishes
//! `WorkerStarted` / `WorkerExited` on its bus. [`CallbackNotifier`] is a
//! subscriber that turns those into [`CallbackMessage`]s and delivers them to a
//! [`CallbackTarget`] with bounded retries, off the controller's path.
//!
//! ```text
//! Bus ──► SubscriberSet ──► CallbackNotifier::on_event
//!                                 │ tokio::spawn
//!                                 ▼
//!                    attempt 1 ─(fail)─ backoff ─ attempt 2 ─ ... ─ attempt N
//!                    (each under a timeout)                         │
//!                                                  Exhausted → logged, dropped
//! ```
//!
//! Delivery is never guaranteed and failures never reach the submitting caller.

mod message;
mod notifier;
mod target;

pub use message::{CallbackEvent, CallbackMessage};
pub use notifier::CallbackNotifier;
pub use target::{CallbackTarget, HttpCallback};
