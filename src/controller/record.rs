use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::controller::ticket::TicketId;
use crate::worker::ProgressReader;

/// Worker instance number; also the key into the active map. Never reused.
pub(crate) type WorkerKey = u64;

/// Controller-side bookkeeping for one running worker.
pub(crate) struct WorkerRecord {
    pub(crate) ticket: TicketId,
    pub(crate) worker_id: Arc<str>,
    pub(crate) priority: i32,
    pub(crate) progress: ProgressReader,
    pub(crate) token: CancellationToken,
    pub(crate) last_progress: i64,
    pub(crate) started_at: Instant,
}

impl WorkerRecord {
    /// Drains the conduit and returns the highest progress seen so far.
    pub(crate) fn refresh(&mut self) -> i64 {
        if let Some(max) = self.progress.drain_max() {
            self.last_progress = self.last_progress.max(max);
        }
        self.last_progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::progress_channel;

    #[test]
    fn refresh_never_goes_backwards() {
        let (tx, rx) = progress_channel();
        let mut rec = WorkerRecord {
            ticket: TicketId::generate(),
            worker_id: Arc::from("t-1"),
            priority: 0,
            progress: rx,
            token: CancellationToken::new(),
            last_progress: 0,
            started_at: Instant::now(),
        };
        assert_eq!(rec.refresh(), 0);
        tx.send(40);
        tx.send(10);
        assert_eq!(rec.refresh(), 40);
        tx.send(25);
        assert_eq!(rec.refresh(), 40);
        tx.send(41);
        assert_eq!(rec.refresh(), 41);
    }
}
