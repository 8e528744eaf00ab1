//! Retry delay policies.
//!
//! The callback notifier retries failed deliveries a bounded number of times;
//! these types decide **how long** it waits between attempts.
//!
//! ## Contents
//! - [`BackoffPolicy`] how delays evolve (first / factor / max + jitter)
//! - [`JitterPolicy`]  randomization strategy so that many tickets ending at once
//!   do not hammer the callback target in lockstep
//!
//! ## Quick wiring
//! ```text
//! CallbackConfig { attempts, timeout, backoff: BackoffPolicy }
//!      └─► callback::CallbackNotifier::notify uses:
//!           - backoff.next(attempt) to sleep between failed attempts
//! ```

mod backoff;
mod jitter;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
