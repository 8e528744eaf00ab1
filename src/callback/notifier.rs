//! # CallbackNotifier: bounded-retry delivery of start/end notifications.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::task::TaskTracker;

use crate::callback::{CallbackMessage, CallbackTarget, HttpCallback};
use crate::config::CallbackConfig;
use crate::error::CallbackError;
use crate::events::{Event, EventKind};
use crate::policies::BackoffPolicy;
use crate::subscribers::Subscribe;

/// Delivers callback messages with retries, per-attempt timeouts and backoff.
///
/// As a [`Subscribe`]r it reacts to `WorkerStarted` (→ `started`) and
/// `WorkerExited` (→ `ended`); each delivery runs on its own Tokio task.
/// Clones share the set of in-flight deliveries.
#[derive(Clone)]
pub struct CallbackNotifier {
    target: Arc<dyn CallbackTarget>,
    attempts: u32,
    timeout: Duration,
    backoff: BackoffPolicy,
    deliveries: TaskTracker,
}

impl CallbackNotifier {
    /// Creates a notifier for `target` using the retry knobs of `cfg` (its `url` is ignored).
    pub fn new(target: Arc<dyn CallbackTarget>, cfg: &CallbackConfig) -> Self {
        Self {
            target,
            attempts: cfg.attempts.max(1),
            timeout: cfg.timeout,
            backoff: cfg.backoff,
            deliveries: TaskTracker::new(),
        }
    }

    /// Builds an HTTP notifier if `cfg.url` is set.
    pub fn from_config(cfg: &CallbackConfig) -> Option<Self> {
        let url = cfg.url.as_deref()?;
        Some(Self::new(Arc::new(HttpCallback::new(url)), cfg))
    }

    pub fn endpoint(&self) -> &str {
        self.target.endpoint()
    }

    /// Delivers one message, retrying up to the configured number of attempts.
    ///
    /// # Errors
    /// [`CallbackError::Exhausted`] once every attempt failed or timed out.
    pub async fn notify(&self, msg: &CallbackMessage) -> Result<(), CallbackError> {
        for attempt in 0..self.attempts {
            let res = match tokio::time::timeout(self.timeout, self.target.deliver(msg)).await {
                Ok(res) => res,
                Err(_) => Err(CallbackError::Timeout {
                    timeout: self.timeout,
                }),
            };

            match res {
                Ok(()) => {
                    tracing::info!(
                        endpoint = self.target.endpoint(),
                        ticket = %msg.ticket_id,
                        event = ?msg.event,
                        attempt = attempt + 1,
                        "callback delivered"
                    );
                    return Ok(());
                }
                Err(err) => {
                    tracing::warn!(
                        endpoint = self.target.endpoint(),
                        ticket = %msg.ticket_id,
                        attempt = attempt + 1,
                        of = self.attempts,
                        label = err.as_label(),
                        error = %err,
                        "callback attempt failed"
                    );
                    if attempt + 1 < self.attempts {
                        tokio::time::sleep(self.backoff.next(attempt)).await;
                    }
                }
            }
        }

        let err = CallbackError::Exhausted {
            attempts: self.attempts,
        };
        tracing::error!(
            endpoint = self.target.endpoint(),
            ticket = %msg.ticket_id,
            event = ?msg.event,
            "callback dropped: {err}"
        );
        Err(err)
    }

    /// Waits for spawned deliveries to finish, for at most one full retry
    /// cycle. Returns how many were still pending when the wait gave up.
    pub(crate) async fn drain(&self) -> usize {
        self.deliveries.close();
        let budget = self.retry_budget();
        if tokio::time::timeout(budget, self.deliveries.wait()).await.is_ok() {
            return 0;
        }
        let pending = self.deliveries.len();
        tracing::warn!(
            endpoint = self.target.endpoint(),
            pending,
            budget_ms = budget.as_millis() as u64,
            "callback deliveries abandoned"
        );
        pending
    }

    /// Upper bound on the time one `notify` call can take.
    fn retry_budget(&self) -> Duration {
        self.timeout * self.attempts + self.backoff.max * (self.attempts - 1)
    }
}

#[async_trait]
impl Subscribe for CallbackNotifier {
    async fn on_event(&self, ev: &Event) {
        let Some(ticket) = ev.ticket.as_deref() else {
            return;
        };
        let msg = match ev.kind {
            EventKind::WorkerStarted => CallbackMessage::started(ticket),
            EventKind::WorkerExited => CallbackMessage::ended(ticket),
            _ => return,
        };

        let this = self.clone();
        self.deliveries.spawn(async move {
            let _ = this.notify(&msg).await;
        });
    }

    fn name(&self) -> &'static str {
        "callback-notifier"
    }
}
