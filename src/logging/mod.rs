//! # Worker log aggregation.
//!
//! Workers never write logs directly. Each [`WorkerContext`](crate::WorkerContext)
//! holds a sender into one unbounded channel per controller; a single drain
//! routine forwards every [`LogRecord`] to the configured [`LogSink`], so sink
//! writes are serialised.
//!
//! ```text
//! worker 1 ──┐
//! worker 2 ──┼──► mpsc (unbounded) ──► drain routine ──► LogSink::write
//! worker N ──┘                          (panics caught)
//! ```
//!
//! Sink initialisation happens once per [`SinkInit`], which callers share
//! explicitly between controllers that use the same sink.

mod aggregator;
mod init;
mod record;
mod sink;

pub(crate) use aggregator::LogAggregator;
pub use init::SinkInit;
pub use record::{Level, LogRecord};
pub use sink::{LogSink, TracingSink};
