//! # Worker context handed to [`Task::execute`](crate::Task::execute).
//!
//! Bundles everything a running task may touch:
//! - the ticket it serves and its worker identity (`"<task>-<instance>"`)
//! - the progress writer
//! - the cancellation token, observed through [`checkpoint`](WorkerContext::checkpoint)
//! - a sender into the controller's log aggregator

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::controller::TicketId;
use crate::error::TaskError;
use crate::logging::{Level, LogRecord};
use crate::worker::ProgressWriter;

/// Per-worker handle passed to the task.
pub struct WorkerContext {
    ticket: TicketId,
    worker_id: Arc<str>,
    token: CancellationToken,
    progress: ProgressWriter,
    logs: mpsc::UnboundedSender<LogRecord>,
}

impl WorkerContext {
    pub(crate) fn new(
        ticket: TicketId,
        worker_id: Arc<str>,
        token: CancellationToken,
        progress: ProgressWriter,
        logs: mpsc::UnboundedSender<LogRecord>,
    ) -> Self {
        Self {
            ticket,
            worker_id,
            token,
            progress,
            logs,
        }
    }

    /// Ticket this worker serves.
    pub fn ticket(&self) -> &TicketId {
        &self.ticket
    }

    /// Worker identity, `"<task name>-<instance>"`.
    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    /// Publishes a progress value. Readers only ever see the maximum reported so far.
    pub fn report_progress(&self, value: i64) {
        if !self.progress.send(value) {
            tracing::trace!(worker = %self.worker_id, value, "progress conduit closed");
        }
    }

    /// True once cancellation has been requested for this worker.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancellation point.
    ///
    /// Returns `Err(TaskError::Aborted)` if cancellation was requested, after
    /// logging `"Task <name>-<instance> aborted by signal."` at critical level.
    /// Tasks propagate it with `?`.
    pub fn checkpoint(&self) -> Result<(), TaskError> {
        if self.token.is_cancelled() {
            self.critical(format!("Task {} aborted by signal.", self.worker_id));
            return Err(TaskError::Aborted);
        }
        Ok(())
    }

    /// Sends a record to the controller's log aggregator.
    pub fn log(&self, level: Level, message: impl Into<String>) {
        let record = LogRecord::new(level, message, Arc::clone(&self.worker_id));
        if let Err(mpsc::error::SendError(record)) = self.logs.send(record) {
            // Aggregator already stopped (controller shut down).
            tracing::debug!(worker = %record.worker, level = record.level.as_str(), message = %record.message, "late worker log");
        }
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(Level::Debug, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(Level::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(Level::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(Level::Error, message);
    }

    pub fn critical(&self, message: impl Into<String>) {
        self.log(Level::Critical, message);
    }
}

impl std::fmt::Debug for WorkerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerContext")
            .field("ticket", &self.ticket)
            .field("worker_id", &self.worker_id)
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}
