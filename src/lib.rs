//! # ticketvisor
//!
//! **Ticketvisor** runs long-lived blocking work behind a ticket interface.
//!
//! Callers submit a parameter map with a priority and get a ticket id back at
//! once. A controller admits tickets by priority under a strict concurrency
//! cap, runs each on its own blocking thread, tracks progress reported by the
//! task, supports cooperative cancellation and sends best-effort start/end
//! notifications.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   submit(params, priority)      status(ticket)         cancel(ticket)
//!            │                         │                       │
//!            ▼                         ▼                       ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Controller (one async mutex)                                     │
//! │  - AdmissionQueue (priority desc, FIFO among equals)              │
//! │  - active: WorkerKey → WorkerRecord (progress reader, token)      │
//! │  - tickets: TicketId → WorkerKey                                  │
//! └──────┬─────────────────────────────────────────────────────┬──────┘
//!        │ admission loop (wake: Notify)                       │
//!        ▼                                                     │
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   │
//!     │   Worker 1   │   │   Worker 2   │   │   Worker N   │   │ publishes
//!     │ spawn_blocking│  │ spawn_blocking│  │ spawn_blocking│  │ events
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘   │
//!      │ progress / logs  │                  │                 │
//!      │ checkpoint()     │                  │                 │
//!      ▼                  ▼                  ▼                 ▼
//!  supervising routines (TaskTracker) ──► cleanup ──► Bus (broadcast)
//!                                                          │
//!                                               ┌──────────┴─────────┐
//!                                               ▼                    ▼
//!                                        SubscriberSet ─────► CallbackNotifier
//!                                        (per-sub queues)     LogWriter, user subs
//!
//!  worker logs ──► mpsc ──► log aggregator ──► LogSink (TracingSink by default)
//! ```
//!
//! ### Ticket lifecycle
//! ```text
//! submit ──► queued ──(slot free, highest priority)──► active ──► gone
//!                                                        │
//!            cancel ──► token set ──► checkpoint()? ─────┘
//!
//! status: queued → progress 0, active → max progress so far, gone → unknown
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                         |
//! |-------------------|---------------------------------------------------------------|--------------------------------------------|
//! | **Controller**    | Priority admission, concurrency cap, progress, cancellation.  | [`Controller`], [`ControllerBuilder`]      |
//! | **Tasks**         | Blocking units of work with cooperative cancellation.         | [`Task`], [`TaskFn`], [`WorkerContext`]    |
//! | **Service API**   | Call surface for request layers, with call logging.           | [`TicketService`], [`Logged`]              |
//! | **Callbacks**     | Best-effort start/end notifications with bounded retries.     | [`CallbackTarget`], [`HttpCallback`]       |
//! | **Worker logs**   | Aggregated, serialised log records from all workers.          | [`LogSink`], [`TracingSink`], [`SinkInit`] |
//! | **Subscriber API**| Hook into controller lifecycle events.                        | [`Subscribe`], [`LogWriter`]               |
//! | **Errors**        | Typed errors for callers, tasks, callbacks and shutdown.      | [`ControllerError`], [`TaskError`]         |
//! | **Configuration** | Plain structs with defaults and sentinel values.              | [`ControllerConfig`], [`CallbackConfig`]   |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use ticketvisor::{Controller, ControllerConfig, LogWriter, Params, Subscribe, TaskFn, TaskRef, TicketState};
//!
//! #[tokio::main(flavor = "multi_thread", worker_threads = 2)]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let resize: TaskRef = TaskFn::arc("resize", |ctx, params| {
//!         let steps = params.get("steps").and_then(|v| v.as_i64()).unwrap_or(3);
//!         for step in 1..=steps {
//!             ctx.checkpoint()?;
//!             ctx.report_progress(step);
//!         }
//!         ctx.info("done");
//!         Ok(())
//!     });
//!
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
//!     let ctrl = Controller::builder(ControllerConfig::new("images", 2), resize)
//!         .with_subscribers(subs)
//!         .build()?;
//!
//!     let mut params = Params::new();
//!     params.insert("steps".into(), 5.into());
//!     let reply = ctrl.submit(params, 0).await?;
//!
//!     while ctrl.status(reply.ticket_id.as_str()).await.state != TicketState::Unknown {
//!         tokio::time::sleep(std::time::Duration::from_millis(10)).await;
//!     }
//!
//!     ctrl.shutdown().await?;
//!     Ok(())
//! }
//! ```
mod callback;
mod config;
mod controller;
mod error;
mod events;
mod logging;
mod panic;
mod policies;
mod subscribers;
mod tasks;
mod worker;

// ---- Public re-exports ----

pub use callback::{CallbackEvent, CallbackMessage, CallbackNotifier, CallbackTarget, HttpCallback};
pub use config::{CallbackConfig, ControllerConfig};
pub use controller::{
    ActiveTicket, CancelReply, Controller, ControllerBuilder, Logged, StatusReply, SubmitReply,
    TicketId, TicketService, TicketState,
};
pub use error::{CallbackError, ControllerError, RuntimeError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use logging::{Level, LogRecord, LogSink, SinkInit, TracingSink};
pub use policies::{BackoffPolicy, JitterPolicy};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
pub use tasks::{Params, Task, TaskFn, TaskRef};
pub use worker::WorkerContext;
