//! # Controller core.
//!
//! Owns the admission queue, the active-worker map and the ticket bookkeeping,
//! all behind one async mutex. Two kinds of background routines touch that
//! state:
//!
//! - the **admission loop** (one per controller) wakes on [`Notify`] and starts
//!   workers while `|active| < max_concurrency`;
//! - a **supervising routine** per worker awaits its termination, cleans up,
//!   frees the slot and wakes the admission loop.
//!
//! ```text
//! submit ──► queue.push ──► wake ─┐
//!                                 ▼
//!                       admission loop ── pop head ──► spawn worker ──► supervise
//!                                 ▲                                       │
//!                                 └────────────── wake ◄── cleanup ◄──────┘
//! ```
//!
//! The check-then-insert on the active map happens in a single critical
//! section, so the concurrency cap cannot be overshot.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, Notify, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::callback::CallbackNotifier;
use crate::config::ControllerConfig;
use crate::controller::admission::AdmissionQueue;
use crate::controller::builder::ControllerBuilder;
use crate::controller::record::{WorkerKey, WorkerRecord};
use crate::controller::reply::{ActiveTicket, CancelReply, StatusReply, SubmitReply};
use crate::controller::ticket::{Ticket, TicketId};
use crate::error::{ControllerError, RuntimeError};
use crate::events::{Bus, Event, EventKind};
use crate::logging::{LogAggregator, LogRecord};
use crate::tasks::{Params, TaskRef};
use crate::worker::{self, WorkerContext, WorkerOutcome, progress_channel};

/// Mutable controller state; guarded by `Controller::state`.
pub(crate) struct State {
    pub(crate) queue: AdmissionQueue,
    pub(crate) active: HashMap<WorkerKey, WorkerRecord>,
    pub(crate) tickets: HashMap<TicketId, WorkerKey>,
    next_sequence: u64,
    next_key: WorkerKey,
}

impl State {
    pub(crate) fn new(queue: AdmissionQueue) -> Self {
        Self {
            queue,
            active: HashMap::new(),
            tickets: HashMap::new(),
            next_sequence: 0,
            next_key: 1,
        }
    }
}

/// Routines that outlive every worker and are stopped last by `shutdown`.
pub(crate) struct Background {
    pub(crate) aggregator: LogAggregator,
    pub(crate) listener_token: CancellationToken,
    pub(crate) listener: JoinHandle<()>,
    pub(crate) notifier: Option<CallbackNotifier>,
}

impl Background {
    /// Flushes worker logs, drains the subscribers, then waits for pending
    /// callback deliveries.
    async fn stop(self, controller: &str) {
        let written = self.aggregator.stop().await;
        tracing::debug!(controller, written, "worker log drain stopped");

        self.listener_token.cancel();
        if let Err(err) = self.listener.await {
            tracing::error!(controller, error = %err, "event listener failed");
        }
        if let Some(notifier) = self.notifier {
            let pending = notifier.drain().await;
            tracing::debug!(controller, pending, "callback deliveries drained");
        }
    }
}

/// Priority-admitting, concurrency-capped worker controller.
///
/// Built with [`Controller::builder`]; shared as `Arc<Controller>`.
///
/// # Example
/// ```no_run
/// use ticketvisor::{Controller, ControllerConfig, Params, TaskFn};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let task = TaskFn::arc("count", |ctx, _params| {
///         for i in 0..100 {
///             ctx.checkpoint()?;
///             ctx.report_progress(i);
///         }
///         Ok(())
///     });
///
///     let ctrl = Controller::builder(ControllerConfig::new("counter", 2), task).build()?;
///     let reply = ctrl.submit(Params::new(), 0).await?;
///     println!("{:?}", ctrl.status(reply.ticket_id.as_str()).await);
///
///     ctrl.shutdown().await?;
///     Ok(())
/// }
/// ```
pub struct Controller {
    cfg: ControllerConfig,
    task: TaskRef,
    bus: Bus,
    state: Mutex<State>,
    wake: Notify,
    runtime_token: CancellationToken,
    tracker: TaskTracker,
    logs: mpsc::UnboundedSender<LogRecord>,
    background: Mutex<Option<Background>>,
}

impl Controller {
    /// Starts building a controller that runs `task` for every admitted ticket.
    pub fn builder(cfg: ControllerConfig, task: TaskRef) -> ControllerBuilder {
        ControllerBuilder::new(cfg, task)
    }

    pub(crate) fn new_internal(
        cfg: ControllerConfig,
        task: TaskRef,
        bus: Bus,
        background: Background,
    ) -> Self {
        let queue = AdmissionQueue::new(cfg.queue_limit());
        Self {
            task,
            bus,
            state: Mutex::new(State::new(queue)),
            wake: Notify::new(),
            runtime_token: CancellationToken::new(),
            tracker: TaskTracker::new(),
            logs: background.aggregator.sender(),
            background: Mutex::new(Some(background)),
            cfg,
        }
    }

    /// Controller name from the config.
    pub fn name(&self) -> &str {
        &self.cfg.name
    }

    /// Configuration this controller was built with.
    pub fn config(&self) -> &ControllerConfig {
        &self.cfg
    }

    /// Event bus of this controller; subscribe to observe lifecycle events.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Queues a new ticket and returns its id immediately.
    ///
    /// Never waits for a worker.
    ///
    /// # Errors
    /// - [`ControllerError::AdmissionRejected`] if a bounded queue is full
    /// - [`ControllerError::Closed`] after [`shutdown`](Self::shutdown)
    pub async fn submit(&self, params: Params, priority: i32) -> Result<SubmitReply, ControllerError> {
        let mut st = self.state.lock().await;
        if self.runtime_token.is_cancelled() {
            return Err(ControllerError::Closed);
        }

        let sequence = st.next_sequence;
        let ticket = Ticket::new(params, priority, sequence);
        let ticket_id = ticket.id.clone();

        if let Err(err) = st.queue.push(ticket) {
            drop(st);
            self.bus.publish(
                Event::new(EventKind::TicketRejected)
                    .with_priority(priority)
                    .with_reason(err.to_string()),
            );
            return Err(err);
        }
        st.next_sequence += 1;
        let has_room = st.active.len() < self.cfg.max_concurrency;
        drop(st);

        self.bus.publish(
            Event::new(EventKind::TicketQueued)
                .with_ticket(ticket_id.clone())
                .with_priority(priority),
        );
        if has_room {
            self.wake.notify_one();
        }
        Ok(SubmitReply {
            ticket_id,
            sequence,
        })
    }

    /// Reports where a ticket is and, if active, the highest progress seen so far.
    pub async fn status(&self, ticket: &str) -> StatusReply {
        let mut st = self.state.lock().await;

        let key = st.tickets.get(ticket).copied();
        if let Some(rec) = key.and_then(|key| st.active.get_mut(&key)) {
            return StatusReply::active(rec.refresh());
        }
        if st.queue.contains(ticket) {
            return StatusReply::queued();
        }
        StatusReply::unknown()
    }

    /// Requests cooperative cancellation of an active ticket.
    ///
    /// The worker stops at its next checkpoint. Queued and unknown tickets are
    /// not cancellable and answer `accepted = false`.
    pub async fn cancel(&self, ticket: &str) -> CancelReply {
        let st = self.state.lock().await;
        let Some(rec) = st.tickets.get(ticket).and_then(|key| st.active.get(key)) else {
            return CancelReply { accepted: false };
        };

        rec.token.cancel();
        self.bus.publish(
            Event::new(EventKind::CancelRequested)
                .with_ticket(rec.ticket.clone())
                .with_worker(Arc::clone(&rec.worker_id)),
        );
        CancelReply { accepted: true }
    }

    /// Number of running workers.
    pub async fn active_count(&self) -> usize {
        self.state.lock().await.active.len()
    }

    /// Number of tickets waiting for a slot.
    pub async fn queued_count(&self) -> usize {
        self.state.lock().await.queue.len()
    }

    /// Active tickets with their current progress, in start order.
    pub async fn snapshot(&self) -> Vec<ActiveTicket> {
        let mut st = self.state.lock().await;
        let mut entries: Vec<(WorkerKey, ActiveTicket)> = st
            .active
            .iter_mut()
            .map(|(key, rec)| {
                let progress = rec.refresh();
                (
                    *key,
                    ActiveTicket {
                        ticket_id: rec.ticket.clone(),
                        worker: rec.worker_id.to_string(),
                        priority: rec.priority,
                        progress,
                        running_ms: rec.started_at.elapsed().as_millis() as u64,
                    },
                )
            })
            .collect();
        entries.sort_by_key(|(key, _)| *key);
        entries.into_iter().map(|(_, t)| t).collect()
    }

    /// Stops the controller.
    ///
    /// Refuses new submissions, discards queued tickets, cancels every worker
    /// and waits up to `grace` for them to reach a checkpoint. Worker logs are
    /// flushed, subscribers drained and pending callbacks settled before
    /// returning. When the grace period runs out, that teardown is deferred to a
    /// background task that first waits for the remaining workers to exit.
    /// Calling it again is a no-op.
    ///
    /// # Errors
    /// [`RuntimeError::GraceExceeded`] with the tickets whose workers were still
    /// running when the grace period ran out.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let discarded = {
            let mut st = self.state.lock().await;
            if self.runtime_token.is_cancelled() {
                return Ok(());
            }
            self.bus.publish(Event::new(EventKind::ShutdownRequested));
            self.runtime_token.cancel();
            st.queue.drain()
        };
        tracing::info!(
            controller = %self.cfg.name,
            discarded = discarded.len(),
            "controller shutting down"
        );
        for t in discarded {
            self.bus
                .publish(Event::new(EventKind::QueueDiscarded).with_ticket(t.id));
        }

        self.tracker.close();
        let grace = self.cfg.grace;
        let res = match tokio::time::timeout(grace, self.tracker.wait()).await {
            Ok(()) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_) => {
                let stuck: Vec<String> = {
                    let st = self.state.lock().await;
                    st.active.values().map(|r| r.ticket.to_string()).collect()
                };
                self.bus.publish(
                    Event::new(EventKind::GraceExceeded)
                        .with_reason(format!("stuck={stuck:?}")),
                );
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        };

        let Some(bg) = self.background.lock().await.take() else {
            return res;
        };
        if res.is_ok() {
            bg.stop(&self.cfg.name).await;
        } else {
            // Stuck workers still log and publish their exit once they return.
            let tracker = self.tracker.clone();
            let name = self.cfg.name.clone();
            tokio::spawn(async move {
                tracker.wait().await;
                bg.stop(&name).await;
            });
        }
        res
    }

    /// Admission loop: runs until shutdown.
    pub(crate) async fn admission_loop(self: Arc<Self>) {
        loop {
            tokio::select! {
                _ = self.runtime_token.cancelled() => break,
                _ = self.wake.notified() => self.admit().await,
            }
        }
        tracing::debug!(controller = %self.cfg.name, "admission loop stopped");
    }

    /// Starts workers for queued tickets while there is room.
    async fn admit(self: &Arc<Self>) {
        let mut st = self.state.lock().await;
        while st.active.len() < self.cfg.max_concurrency {
            if self.runtime_token.is_cancelled() {
                break;
            }
            let Some(ticket) = st.queue.pop() else {
                break;
            };
            self.start_worker(&mut st, ticket);
            assert!(
                st.active.len() <= self.cfg.max_concurrency,
                "concurrency cap exceeded: {} active, max {}",
                st.active.len(),
                self.cfg.max_concurrency
            );
        }
    }

    fn start_worker(self: &Arc<Self>, st: &mut State, ticket: Ticket) {
        let key = st.next_key;
        st.next_key += 1;

        let worker_id: Arc<str> = Arc::from(format!("{}-{}", self.task.name(), key));
        let token = self.runtime_token.child_token();
        let (writer, reader) = progress_channel();
        let ctx = WorkerContext::new(
            ticket.id.clone(),
            Arc::clone(&worker_id),
            token.clone(),
            writer,
            self.logs.clone(),
        );

        tracing::debug!(
            controller = %self.cfg.name,
            ticket = %ticket.id,
            worker = %worker_id,
            waited_ms = ticket.submitted_at.elapsed().as_millis() as u64,
            "admitting ticket"
        );
        let handle = worker::spawn(Arc::clone(&self.task), ctx, ticket.params);

        st.tickets.insert(ticket.id.clone(), key);
        st.active.insert(
            key,
            WorkerRecord {
                ticket: ticket.id.clone(),
                worker_id: Arc::clone(&worker_id),
                priority: ticket.priority,
                progress: reader,
                token,
                last_progress: 0,
                started_at: std::time::Instant::now(),
            },
        );

        self.bus.publish(
            Event::new(EventKind::WorkerStarted)
                .with_ticket(ticket.id)
                .with_worker(worker_id)
                .with_priority(ticket.priority),
        );

        let this = Arc::clone(self);
        self.tracker.spawn(async move { this.supervise(key, handle).await });
    }

    /// Awaits one worker and releases its slot.
    async fn supervise(self: Arc<Self>, key: WorkerKey, handle: JoinHandle<WorkerOutcome>) {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(err) => WorkerOutcome::Failed(err.to_string()),
        };

        let removed = {
            let mut st = self.state.lock().await;
            let rec = st.active.remove(&key);
            if let Some(rec) = &rec {
                st.tickets.remove(&rec.ticket);
            }
            rec
        };
        self.wake.notify_one();

        let Some(rec) = removed else {
            tracing::error!(controller = %self.cfg.name, key, "worker record missing at exit");
            return;
        };
        let discarded = rec.progress.close();
        tracing::debug!(
            controller = %self.cfg.name,
            ticket = %rec.ticket,
            worker = %rec.worker_id,
            outcome = outcome.as_label(),
            discarded,
            "worker exited"
        );

        self.bus.publish(
            Event::new(EventKind::WorkerExited)
                .with_ticket(rec.ticket)
                .with_worker(rec.worker_id)
                .with_progress(rec.last_progress),
        );
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("name", &self.cfg.name)
            .field("max_concurrency", &self.cfg.max_concurrency)
            .field("task", &self.task.name())
            .field("closed", &self.runtime_token.is_cancelled())
            .finish()
    }
}
