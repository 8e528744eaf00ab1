//! # Closure-backed task (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: Fn(&WorkerContext, &Params) -> Result<(), TaskError>`.
//! The same closure runs for every admitted ticket, possibly on several threads
//! at once; keep shared state behind `Arc<...>` explicitly.
//!
//! ## Example
//! ```rust
//! use ticketvisor::{TaskFn, TaskRef};
//!
//! let t: TaskRef = TaskFn::arc("sleeper", |ctx, _params| {
//!     for step in 0..3 {
//!         ctx.checkpoint()?;
//!         ctx.report_progress(step);
//!     }
//!     Ok(())
//! });
//!
//! assert_eq!(t.name(), "sleeper");
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use crate::error::TaskError;
use crate::tasks::task::{Params, Task};
use crate::worker::WorkerContext;

/// Shared handle to a task object.
pub type TaskRef = Arc<dyn Task>;

/// Closure-backed task implementation.
#[derive(Debug)]
pub struct TaskFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> TaskFn<F>
where
    F: Fn(&WorkerContext, &Params) -> Result<(), TaskError> + Send + Sync + 'static,
{
    /// Creates a new closure-backed task.
    ///
    /// Prefer [`TaskFn::arc`] when you immediately need a [`TaskRef`].
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the task and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F> Task for TaskFn<F>
where
    F: Fn(&WorkerContext, &Params) -> Result<(), TaskError> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, ctx: &WorkerContext, params: &Params) -> Result<(), TaskError> {
        (self.f)(ctx, params)
    }
}
