//! # Event bus for controller lifecycle events.
//!
//! [`Bus`] wraps [`tokio::sync::broadcast`] so that any part of the controller
//! can publish without blocking.
//!
//! ```text
//! Publishers (many):                   Subscriber (one):
//!   submit / cancel ──┐
//!   admission loop  ──┼────► Bus ────► bus listener ────► SubscriberSet
//!   supervisors     ──┤  (broadcast)   (in Controller)
//!   shutdown        ──┘
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never waits.
//! - **Bounded capacity**: slow receivers observe `RecvError::Lagged(n)` and skip `n` events.
//! - **No persistence**: events sent while nobody listens are lost.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for controller events.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus; capacity is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active receivers (dropped if there are none).
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver for events sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
