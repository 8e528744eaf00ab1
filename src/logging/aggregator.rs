//! Drain routine forwarding worker records to the sink.

use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::logging::{LogRecord, LogSink, SinkInit};
use crate::panic::panic_message;

/// Handle to a running drain routine.
pub(crate) struct LogAggregator {
    tx: mpsc::UnboundedSender<LogRecord>,
    token: CancellationToken,
    handle: JoinHandle<usize>,
}

impl LogAggregator {
    /// Initialises the sink (once per `init`) and spawns the drain routine.
    pub(crate) fn spawn(sink: Arc<dyn LogSink>, init: &SinkInit) -> Self {
        init.run(|| sink.init());

        let (tx, rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();
        let handle = tokio::spawn(drain(sink, rx, token.clone()));
        Self { tx, token, handle }
    }

    /// Sender handed to each worker context.
    pub(crate) fn sender(&self) -> mpsc::UnboundedSender<LogRecord> {
        self.tx.clone()
    }

    /// Stops the routine after it has written everything already queued.
    ///
    /// Returns the number of records written over the aggregator's lifetime.
    pub(crate) async fn stop(self) -> usize {
        self.token.cancel();
        drop(self.tx);
        self.handle.await.unwrap_or_else(|err| {
            tracing::error!(error = %err, "log drain routine failed");
            0
        })
    }
}

async fn drain(
    sink: Arc<dyn LogSink>,
    mut rx: mpsc::UnboundedReceiver<LogRecord>,
    token: CancellationToken,
) -> usize {
    let mut written = 0usize;
    loop {
        tokio::select! {
            biased;
            rec = rx.recv() => match rec {
                Some(rec) => {
                    write_one(sink.as_ref(), &rec).await;
                    written += 1;
                }
                None => break,
            },
            _ = token.cancelled() => {
                while let Ok(rec) = rx.try_recv() {
                    write_one(sink.as_ref(), &rec).await;
                    written += 1;
                }
                break;
            }
        }
    }
    written
}

async fn write_one(sink: &dyn LogSink, rec: &LogRecord) {
    if let Err(payload) = std::panic::AssertUnwindSafe(sink.write(rec))
        .catch_unwind()
        .await
    {
        tracing::error!(
            sink = sink.name(),
            worker = %rec.worker,
            info = %panic_message(&*payload),
            "log sink panicked"
        );
    }
}
