//! Ticket identity and the admission record behind it.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::tasks::Params;

/// Opaque, globally unique ticket identifier (UUID v4 text).
///
/// Cheap to clone. Maps keyed by `TicketId` can be queried with a plain `&str`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TicketId(Arc<str>);

impl TicketId {
    /// Mints a fresh random id.
    pub fn generate() -> Self {
        Self(Arc::from(Uuid::new_v4().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TicketId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TicketId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<TicketId> for Arc<str> {
    fn from(id: TicketId) -> Self {
        id.0
    }
}

impl Serialize for TicketId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// A submitted request waiting for (or holding) a worker.
#[derive(Debug)]
pub(crate) struct Ticket {
    pub(crate) id: TicketId,
    pub(crate) params: Params,
    pub(crate) priority: i32,
    /// Submission order; breaks priority ties (lower first).
    pub(crate) sequence: u64,
    pub(crate) submitted_at: Instant,
}

impl Ticket {
    pub(crate) fn new(params: Params, priority: i32, sequence: u64) -> Self {
        Self {
            id: TicketId::generate(),
            params,
            priority,
            sequence,
            submitted_at: Instant::now(),
        }
    }
}
