//! Runs one task instance on the blocking pool and classifies how it ended.
//!
//! Panics and `TaskError::Failed` are logged at critical level through the
//! worker's own context and end the worker; neither reaches the controller,
//! which only observes that the worker terminated.

use std::panic::{AssertUnwindSafe, catch_unwind};

use tokio::task::JoinHandle;

use crate::error::TaskError;
use crate::panic::panic_message;
use crate::tasks::{Params, Task, TaskRef};
use crate::worker::WorkerContext;

/// How a worker ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum WorkerOutcome {
    Completed,
    Aborted,
    Failed(String),
}

impl WorkerOutcome {
    pub(crate) fn as_label(&self) -> &'static str {
        match self {
            WorkerOutcome::Completed => "completed",
            WorkerOutcome::Aborted => "aborted",
            WorkerOutcome::Failed(_) => "failed",
        }
    }
}

/// Spawns the worker on a dedicated blocking thread.
pub(crate) fn spawn(task: TaskRef, ctx: WorkerContext, params: Params) -> JoinHandle<WorkerOutcome> {
    tokio::task::spawn_blocking(move || run(task.as_ref(), &ctx, &params))
}

pub(crate) fn run(task: &dyn Task, ctx: &WorkerContext, params: &Params) -> WorkerOutcome {
    ctx.debug(format!("Task {} started.", ctx.worker_id()));

    match catch_unwind(AssertUnwindSafe(|| task.execute(ctx, params))) {
        Ok(Ok(())) => {
            ctx.info(format!("Task {} completed.", ctx.worker_id()));
            WorkerOutcome::Completed
        }
        Ok(Err(TaskError::Aborted)) => {
            ctx.info(format!("Task {} stopped after cancellation.", ctx.worker_id()));
            WorkerOutcome::Aborted
        }
        Ok(Err(err)) => {
            ctx.critical(format!("Task {} failed: {err}", ctx.worker_id()));
            WorkerOutcome::Failed(err.to_string())
        }
        Err(payload) => {
            let msg = panic_message(&*payload);
            ctx.critical(format!("Task {} panicked: {msg}", ctx.worker_id()));
            WorkerOutcome::Failed(msg)
        }
    }
}
