//! # Worker execution.
//!
//! One worker runs one task instance for one admitted ticket on a dedicated
//! blocking thread.
//!
//! ```text
//! admission loop ──► spawn(task, ctx, params)
//!                        │
//!                        ▼ spawn_blocking
//!                 ┌─────────────────────────────────────────┐
//!                 │ catch_unwind(task.execute(ctx, params)) │
//!                 │   ctx.report_progress(v) ──► ProgressWriter ──┐
//!                 │   ctx.checkpoint()?      ◄── CancellationToken│
//!                 │   ctx.info(..)           ──► log aggregator   │
//!                 └─────────────────────────────────────────┘     │
//!                        │ WorkerOutcome                          ▼
//!                 supervising routine                    ProgressReader
//!                                                        (status: drain + max)
//! ```
//!
//! - [`WorkerContext`] is the only handle a task gets.
//! - The progress conduit is internal; the controller owns the reader end.

mod context;
mod harness;
mod progress;

pub use context::WorkerContext;
pub(crate) use harness::{WorkerOutcome, spawn};
pub(crate) use progress::{ProgressReader, ProgressWriter, channel as progress_channel};
