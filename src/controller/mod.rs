//! # Ticket controller.
//!
//! - [`Controller`] admission queue, worker pool, progress and cancellation
//! - [`ControllerBuilder`] wiring of subscribers, log sink and callback target
//! - [`TicketService`], [`Logged`] the call surface for request layers
//! - [`TicketId`] and the reply types

mod admission;
mod builder;
mod core;
mod record;
mod reply;
mod service;
mod ticket;

pub use builder::ControllerBuilder;
pub use self::core::Controller;
pub use reply::{ActiveTicket, CancelReply, StatusReply, SubmitReply, TicketState};
pub use service::{Logged, TicketService};
pub use ticket::TicketId;
