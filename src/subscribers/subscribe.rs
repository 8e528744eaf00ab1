//! # Core subscriber trait
//!
//! Each subscriber is driven by its own worker loop, fed by a bounded queue
//! owned by the [`SubscriberSet`](crate::SubscriberSet). A slow subscriber
//! (for example a callback target that keeps timing out) never delays the
//! controller or other subscribers.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use ticketvisor::{Event, EventKind, Subscribe};
//!
//! struct Audit;
//!
//! #[async_trait]
//! impl Subscribe for Audit {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::WorkerExited {
//!             // write audit record...
//!         }
//!     }
//!     fn name(&self) -> &'static str { "audit" }
//! }
//! ```

use crate::events::Event;
use async_trait::async_trait;

/// Contract for event subscribers.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    ///
    /// On overflow, events for this subscriber are **dropped**.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
