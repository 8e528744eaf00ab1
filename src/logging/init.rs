use std::sync::Once;

/// One-shot guard for sink initialisation.
///
/// Controllers built with the same `Arc<SinkInit>` initialise their sink only
/// once, however many of them exist.
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use ticketvisor::SinkInit;
///
/// let init = SinkInit::new();
/// let calls = AtomicUsize::new(0);
/// init.run(|| { calls.fetch_add(1, Ordering::SeqCst); });
/// init.run(|| { calls.fetch_add(1, Ordering::SeqCst); });
/// assert_eq!(calls.load(Ordering::SeqCst), 1);
/// assert!(init.is_done());
/// ```
#[derive(Debug)]
pub struct SinkInit {
    once: Once,
}

impl SinkInit {
    pub const fn new() -> Self {
        Self { once: Once::new() }
    }

    /// Runs `f` unless this guard already ran something.
    pub fn run(&self, f: impl FnOnce()) {
        self.once.call_once(f);
    }

    pub fn is_done(&self) -> bool {
        self.once.is_completed()
    }
}

impl Default for SinkInit {
    fn default() -> Self {
        Self::new()
    }
}
