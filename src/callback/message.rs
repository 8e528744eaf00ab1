use serde::{Deserialize, Serialize};

/// Which lifecycle edge a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallbackEvent {
    Started,
    Ended,
}

/// Notification body, serialised as `{"event": "started", "ticketId": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackMessage {
    pub event: CallbackEvent,
    pub ticket_id: String,
}

impl CallbackMessage {
    pub fn started(ticket_id: impl Into<String>) -> Self {
        Self {
            event: CallbackEvent::Started,
            ticket_id: ticket_id.into(),
        }
    }

    pub fn ended(ticket_id: impl Into<String>) -> Self {
        Self {
            event: CallbackEvent::Ended,
            ticket_id: ticket_id.into(),
        }
    }
}
