//! # Task abstractions.
//!
//! This module provides the task plugin interface:
//! - [`Task`] - trait for implementing blocking, cooperatively cancelable tasks
//! - [`TaskFn`] - closure-backed task implementation
//! - [`TaskRef`] - shared reference to a task (`Arc<dyn Task>`)
//! - [`Params`] - named task arguments carried by a ticket

mod task;
mod task_fn;

pub use task::{Params, Task};
pub use task_fn::{TaskFn, TaskRef};
