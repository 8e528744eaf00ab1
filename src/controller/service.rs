//! # Ticket service surface.
//!
//! [`TicketService`] is what a request layer programs against. [`Logged`]
//! wraps any service and records every call, its arguments and its result.
//!
//! ```text
//! request layer ──► Logged<Arc<Controller>> ──► Controller
//!                      └─ tracing::info!(op, args, result)
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::controller::core::Controller;
use crate::controller::reply::{CancelReply, StatusReply, SubmitReply};
use crate::error::ControllerError;
use crate::tasks::Params;

/// The three ticket operations.
#[async_trait]
pub trait TicketService: Send + Sync {
    async fn submit(&self, params: Params, priority: i32) -> Result<SubmitReply, ControllerError>;

    async fn status(&self, ticket: &str) -> StatusReply;

    async fn cancel(&self, ticket: &str) -> CancelReply;
}

#[async_trait]
impl TicketService for Controller {
    async fn submit(&self, params: Params, priority: i32) -> Result<SubmitReply, ControllerError> {
        Controller::submit(self, params, priority).await
    }

    async fn status(&self, ticket: &str) -> StatusReply {
        Controller::status(self, ticket).await
    }

    async fn cancel(&self, ticket: &str) -> CancelReply {
        Controller::cancel(self, ticket).await
    }
}

#[async_trait]
impl<S: TicketService + ?Sized> TicketService for Arc<S> {
    async fn submit(&self, params: Params, priority: i32) -> Result<SubmitReply, ControllerError> {
        (**self).submit(params, priority).await
    }

    async fn status(&self, ticket: &str) -> StatusReply {
        (**self).status(ticket).await
    }

    async fn cancel(&self, ticket: &str) -> CancelReply {
        (**self).cancel(ticket).await
    }
}

/// Logs each call of the wrapped service.
pub struct Logged<S> {
    name: String,
    inner: S,
}

impl<S> Logged<S> {
    pub fn new(name: impl Into<String>, inner: S) -> Self {
        Self {
            name: name.into(),
            inner,
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: TicketService> TicketService for Logged<S> {
    async fn submit(&self, params: Params, priority: i32) -> Result<SubmitReply, ControllerError> {
        let args = serde_json::to_string(&params).unwrap_or_default();
        let res = self.inner.submit(params, priority).await;
        match &res {
            Ok(reply) => tracing::info!(
                service = %self.name,
                op = "submit",
                %args,
                priority,
                ticket = %reply.ticket_id,
                sequence = reply.sequence,
                "call ok"
            ),
            Err(err) => tracing::warn!(
                service = %self.name,
                op = "submit",
                %args,
                priority,
                label = err.as_label(),
                error = %err,
                "call failed"
            ),
        }
        res
    }

    async fn status(&self, ticket: &str) -> StatusReply {
        let reply = self.inner.status(ticket).await;
        tracing::info!(
            service = %self.name,
            op = "status",
            ticket,
            state = ?reply.state,
            progress = reply.progress,
            "call ok"
        );
        reply
    }

    async fn cancel(&self, ticket: &str) -> CancelReply {
        let reply = self.inner.cancel(ticket).await;
        tracing::info!(
            service = %self.name,
            op = "cancel",
            ticket,
            accepted = reply.accepted,
            "call ok"
        );
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::reply::TicketState;
    use crate::controller::ticket::TicketId;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Fake {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TicketService for Fake {
        async fn submit(&self, _params: Params, priority: i32) -> Result<SubmitReply, ControllerError> {
            self.calls.lock().unwrap().push(format!("submit {priority}"));
            if priority < 0 {
                return Err(ControllerError::AdmissionRejected { capacity: 0 });
            }
            Ok(SubmitReply {
                ticket_id: TicketId::generate(),
                sequence: 0,
            })
        }

        async fn status(&self, ticket: &str) -> StatusReply {
            self.calls.lock().unwrap().push(format!("status {ticket}"));
            StatusReply::unknown()
        }

        async fn cancel(&self, ticket: &str) -> CancelReply {
            self.calls.lock().unwrap().push(format!("cancel {ticket}"));
            CancelReply { accepted: false }
        }
    }

    #[tokio::test]
    async fn logged_passes_calls_and_results_through() {
        let svc = Logged::new("fake", Arc::new(Fake::default()));

        assert!(svc.submit(Params::new(), 1).await.is_ok());
        assert!(svc.submit(Params::new(), -1).await.is_err());
        assert_eq!(svc.status("x").await.state, TicketState::Unknown);
        assert!(!svc.cancel("x").await.accepted);

        assert_eq!(
            *svc.inner().calls.lock().unwrap(),
            vec!["submit 1", "submit -1", "status x", "cancel x"]
        );
    }
}
