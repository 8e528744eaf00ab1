//! # Controller lifecycle events.
//!
//! [`EventKind`] classifies what happened; [`Event`] carries the metadata
//! (ticket id, worker identity, priority, progress, reason).
//!
//! ## Ordering guarantees
//! Every event gets a globally unique, monotonically increasing `seq`.
//!
//! ## Example
//! ```rust
//! use ticketvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::WorkerStarted)
//!     .with_ticket("0b8f...")
//!     .with_worker("resize-3");
//!
//! assert_eq!(ev.kind, EventKind::WorkerStarted);
//! assert_eq!(ev.worker.as_deref(), Some("resize-3"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of controller events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Admission ===
    /// A ticket entered the admission queue.
    ///
    /// Sets `ticket`, `priority`.
    TicketQueued,

    /// A submission was refused because the queue is full.
    ///
    /// Sets `priority`, `reason`.
    TicketRejected,

    /// Queued tickets were dropped during shutdown.
    ///
    /// Sets `ticket`.
    QueueDiscarded,

    // === Worker lifecycle ===
    /// A ticket was admitted and its worker spawned.
    ///
    /// Sets `ticket`, `worker`, `priority`.
    WorkerStarted,

    /// A worker terminated (completed, aborted or failed: not distinguished)
    /// and its record was removed.
    ///
    /// Sets `ticket`, `worker`, `progress` (last known value).
    WorkerExited,

    /// `cancel` set the cancellation token of an active worker.
    ///
    /// Sets `ticket`, `worker`.
    CancelRequested,

    // === Shutdown ===
    /// `shutdown` was called.
    ShutdownRequested,

    /// All workers stopped within the grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some workers never reached a checkpoint.
    ///
    /// Sets `reason` (stuck tickets).
    GraceExceeded,

    // === Subscribers ===
    /// Subscriber panicked while handling an event.
    ///
    /// Sets `worker` (subscriber name), `reason` (panic message).
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or closed).
    ///
    /// Sets `worker` (subscriber name), `reason`.
    SubscriberOverflow,
}

/// Controller event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Ticket id, if applicable.
    pub ticket: Option<Arc<str>>,
    /// Worker identity (`<task>-<instance>`) or subscriber name.
    pub worker: Option<Arc<str>>,
    /// Ticket priority.
    pub priority: Option<i32>,
    /// Last known progress value.
    pub progress: Option<i64>,
    /// Human-readable detail.
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates an event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            ticket: None,
            worker: None,
            priority: None,
            progress: None,
            reason: None,
        }
    }

    /// Attaches a ticket id.
    #[inline]
    pub fn with_ticket(mut self, ticket: impl Into<Arc<str>>) -> Self {
        self.ticket = Some(ticket.into());
        self
    }

    /// Attaches a worker identity.
    #[inline]
    pub fn with_worker(mut self, worker: impl Into<Arc<str>>) -> Self {
        self.worker = Some(worker.into());
        self
    }

    /// Attaches a ticket priority.
    #[inline]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Attaches a progress value.
    #[inline]
    pub fn with_progress(mut self, progress: i64) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_worker(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_worker(subscriber)
            .with_reason(info)
    }
}
