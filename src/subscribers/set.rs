//! # Non-blocking event fan-out to multiple subscribers.
//!
//! ```text
//! emit(event)
//!     │
//!     ├──► [queue 1] ──► worker 1 ──► subscriber1.on_event()
//!     │    (bounded)         └──────► panic → SubscriberPanicked
//!     ├──► [queue 2] ──► worker 2 ──► subscriber2.on_event()
//!     └──► [queue N] ──► worker N ──► subscriberN.on_event()
//! ```
//!
//! ## Rules
//! - **Non-blocking**: `emit()` uses `try_send` and returns immediately
//! - **Per-subscriber FIFO**: each subscriber sees events in publish order
//! - **Overflow**: event dropped for that subscriber only, `SubscriberOverflow` published
//! - **Isolation**: a panicking subscriber is reported and keeps receiving events

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::{Bus, Event, EventKind};
use crate::panic::panic_message;
use crate::subscribers::Subscribe;

struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Fan-out coordinator for event subscribers.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Creates the set and spawns one worker per subscriber.
    ///
    /// Must be called inside a Tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));
            let worker_bus = bus.clone();

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = sub.on_event(ev.as_ref());
                    if let Err(payload) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        let info = panic_message(&*payload);
                        tracing::error!(subscriber = sub.name(), %info, "subscriber panicked");
                        worker_bus.publish(Event::subscriber_panicked(sub.name(), info));
                    }
                }
            });
            channels.push(SubscriberChannel { name, sender: tx });
            workers.push(handle);
        }

        Self {
            channels,
            workers,
            bus,
        }
    }

    /// Emits an event to all subscribers (clones it once into an `Arc`).
    pub fn emit(&self, event: &Event) {
        self.emit_arc(Arc::new(event.clone()));
    }

    /// Emits a shared event to all subscribers.
    ///
    /// Overflow events are not re-published when they themselves overflow.
    pub fn emit_arc(&self, event: Arc<Event>) {
        let is_overflow = matches!(event.kind, EventKind::SubscriberOverflow);

        for channel in &self.channels {
            let reason = match channel.sender.try_send(Arc::clone(&event)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            tracing::warn!(subscriber = channel.name, reason, "subscriber dropped event");
            if !is_overflow {
                self.bus
                    .publish(Event::subscriber_overflow(channel.name, reason));
            }
        }
    }

    /// Number of subscribers.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// True if there are no subscribers.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Closes all queues and waits for the workers to drain them.
    pub async fn shutdown(self) {
        drop(self.channels);
        for h in self.workers {
            let _ = h.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder {
        kinds: Mutex<Vec<EventKind>>,
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, event: &Event) {
            self.kinds.lock().unwrap().push(event.kind);
        }
        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    struct Exploder;

    #[async_trait]
    impl Subscribe for Exploder {
        async fn on_event(&self, _event: &Event) {
            panic!("exploder always panics");
        }
        fn name(&self) -> &'static str {
            "exploder"
        }
    }

    #[tokio::test]
    async fn delivers_in_order_to_each_subscriber() {
        let bus = Bus::new(16);
        let rec = Arc::new(Recorder::default());
        let set = SubscriberSet::new(vec![rec.clone() as Arc<dyn Subscribe>], bus);

        set.emit(&Event::new(EventKind::TicketQueued));
        set.emit(&Event::new(EventKind::WorkerStarted));
        set.emit(&Event::new(EventKind::WorkerExited));
        set.shutdown().await;

        assert_eq!(
            *rec.kinds.lock().unwrap(),
            vec![
                EventKind::TicketQueued,
                EventKind::WorkerStarted,
                EventKind::WorkerExited
            ]
        );
    }

    #[tokio::test]
    async fn panicking_subscriber_is_reported_and_isolated() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let rec = Arc::new(Recorder::default());
        let set = SubscriberSet::new(
            vec![Arc::new(Exploder) as Arc<dyn Subscribe>, rec.clone()],
            bus,
        );

        set.emit(&Event::new(EventKind::CancelRequested));

        let ev = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timeout waiting for panic event")
            .expect("bus closed");
        assert_eq!(ev.kind, EventKind::SubscriberPanicked);
        assert_eq!(ev.worker.as_deref(), Some("exploder"));
        assert_eq!(ev.reason.as_deref(), Some("exploder always panics"));

        set.shutdown().await;
        assert_eq!(*rec.kinds.lock().unwrap(), vec![EventKind::CancelRequested]);
    }
}
