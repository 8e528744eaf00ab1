//! Panic payload formatting shared by the places that isolate user code
//! (worker harness, subscriber workers, log drain).

use std::any::Any;

/// Extracts a readable message from a `catch_unwind` payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
