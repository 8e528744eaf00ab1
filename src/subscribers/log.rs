//! # LogWriter: renders controller events through `tracing`.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO  ticket queued ticket=4f1c.. priority=5
//! INFO  worker started ticket=4f1c.. worker=resize-1
//! INFO  cancel requested ticket=4f1c.. worker=resize-1
//! INFO  worker exited ticket=4f1c.. worker=resize-1 progress=12
//! WARN  grace exceeded reason="stuck=[..]"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let ticket = e.ticket.as_deref().unwrap_or("-");
        let worker = e.worker.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");

        match e.kind {
            EventKind::TicketQueued => {
                tracing::info!(seq = e.seq, ticket, priority = ?e.priority, "ticket queued");
            }
            EventKind::TicketRejected => {
                tracing::warn!(seq = e.seq, priority = ?e.priority, reason, "ticket rejected");
            }
            EventKind::QueueDiscarded => {
                tracing::warn!(seq = e.seq, ticket, "queued ticket discarded");
            }
            EventKind::WorkerStarted => {
                tracing::info!(seq = e.seq, ticket, worker, "worker started");
            }
            EventKind::WorkerExited => {
                tracing::info!(seq = e.seq, ticket, worker, progress = ?e.progress, "worker exited");
            }
            EventKind::CancelRequested => {
                tracing::info!(seq = e.seq, ticket, worker, "cancel requested");
            }
            EventKind::ShutdownRequested => tracing::info!(seq = e.seq, "shutdown requested"),
            EventKind::AllStoppedWithin => tracing::info!(seq = e.seq, "all workers stopped within grace"),
            EventKind::GraceExceeded => tracing::warn!(seq = e.seq, reason, "grace exceeded"),
            EventKind::SubscriberOverflow => {
                tracing::warn!(seq = e.seq, subscriber = worker, reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(seq = e.seq, subscriber = worker, reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
