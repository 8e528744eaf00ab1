//! # Task abstraction.
//!
//! A [`Task`] is the user-supplied unit of work a controller runs once per
//! admitted ticket. `execute` runs on a dedicated blocking thread, so it may do
//! CPU-heavy or blocking I/O work freely. It must call
//! [`WorkerContext::checkpoint`] regularly to honor cancellation: there is no
//! forced termination.

use std::collections::BTreeMap;

use crate::error::TaskError;
use crate::worker::WorkerContext;

/// Named task arguments (ordered by key).
pub type Params = BTreeMap<String, serde_json::Value>;

/// # Blocking, cooperatively cancelable unit.
///
/// # Example
/// ```
/// use ticketvisor::{Params, Task, TaskError, WorkerContext};
///
/// struct Count;
///
/// impl Task for Count {
///     fn name(&self) -> &str { "count" }
///
///     fn execute(&self, ctx: &WorkerContext, params: &Params) -> Result<(), TaskError> {
///         let upto = params.get("upto").and_then(|v| v.as_i64()).unwrap_or(10);
///         for i in 0..upto {
///             ctx.checkpoint()?;
///             ctx.report_progress(i);
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Task: Send + Sync + 'static {
    /// Returns a stable, human-readable task name.
    ///
    /// Worker identities are `"<name>-<instance>"`.
    fn name(&self) -> &str;

    /// Runs the task to completion, cancellation or failure.
    ///
    /// Return `Err(TaskError::Aborted)` (usually via `ctx.checkpoint()?`) when
    /// cancelled, `Err(TaskError::Failed)` on failure. Panics are caught by the
    /// worker and treated as failures.
    fn execute(&self, ctx: &WorkerContext, params: &Params) -> Result<(), TaskError>;
}
