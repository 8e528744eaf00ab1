//! Lock-guarded progress conduit between one worker and the controller.
//!
//! The worker appends values; the controller drains everything buffered in one
//! critical section and keeps the maximum. Nothing in here ever blocks beyond
//! the mutex itself.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct Conduit {
    buf: VecDeque<i64>,
    closed: bool,
}

fn lock(inner: &Mutex<Conduit>) -> MutexGuard<'_, Conduit> {
    // A worker that panicked mid-send leaves the buffer consistent: recover it.
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Creates a connected writer/reader pair.
pub(crate) fn channel() -> (ProgressWriter, ProgressReader) {
    let inner = Arc::new(Mutex::new(Conduit::default()));
    (
        ProgressWriter {
            inner: Arc::clone(&inner),
        },
        ProgressReader { inner },
    )
}

/// Worker end.
#[derive(Clone)]
pub(crate) struct ProgressWriter {
    inner: Arc<Mutex<Conduit>>,
}

impl ProgressWriter {
    /// Appends a value; returns `false` once the reader has closed the conduit.
    pub(crate) fn send(&self, value: i64) -> bool {
        let mut c = lock(&self.inner);
        if c.closed {
            return false;
        }
        c.buf.push_back(value);
        true
    }
}

/// Controller end.
pub(crate) struct ProgressReader {
    inner: Arc<Mutex<Conduit>>,
}

impl ProgressReader {
    /// Drains every buffered value and returns the largest, if any.
    pub(crate) fn drain_max(&self) -> Option<i64> {
        let mut c = lock(&self.inner);
        c.buf.drain(..).max()
    }

    /// Closes the conduit and discards whatever is still buffered.
    ///
    /// Returns the number of discarded values.
    pub(crate) fn close(&self) -> usize {
        let mut c = lock(&self.inner);
        c.closed = true;
        let n = c.buf.len();
        c.buf.clear();
        n
    }
}
