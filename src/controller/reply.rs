//! Reply payloads of the ticket operations.
//!
//! All serialise in `camelCase` for whatever request layer sits in front of the
//! controller.

use serde::Serialize;

use crate::controller::ticket::TicketId;

/// Answer to `submit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReply {
    pub ticket_id: TicketId,
    /// Submission order within this controller.
    pub sequence: u64,
}

/// Where a ticket currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketState {
    Queued,
    Active,
    /// Never submitted, or already finished and cleaned up.
    Unknown,
}

/// Answer to `status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReply {
    pub state: TicketState,
    /// Highest progress reported so far; `0` unless active.
    pub progress: i64,
}

impl StatusReply {
    pub(crate) fn active(progress: i64) -> Self {
        Self {
            state: TicketState::Active,
            progress,
        }
    }

    pub(crate) fn queued() -> Self {
        Self {
            state: TicketState::Queued,
            progress: 0,
        }
    }

    pub(crate) fn unknown() -> Self {
        Self {
            state: TicketState::Unknown,
            progress: 0,
        }
    }
}

/// Answer to `cancel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelReply {
    /// True if an active worker was signalled. Queued and unknown tickets are not cancellable.
    pub accepted: bool,
}

/// One entry of [`Controller::snapshot`](crate::Controller::snapshot).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveTicket {
    pub ticket_id: TicketId,
    pub worker: String,
    pub priority: i32,
    pub progress: i64,
    pub running_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shapes() {
        assert_eq!(
            serde_json::to_value(StatusReply::queued()).unwrap(),
            serde_json::json!({"state": "queued", "progress": 0})
        );
        assert_eq!(
            serde_json::to_value(CancelReply { accepted: true }).unwrap(),
            serde_json::json!({"accepted": true})
        );

        let id = TicketId::generate();
        let v = serde_json::to_value(SubmitReply {
            ticket_id: id.clone(),
            sequence: 3,
        })
        .unwrap();
        assert_eq!(v, serde_json::json!({"ticketId": id.as_str(), "sequence": 3}));
    }
}
