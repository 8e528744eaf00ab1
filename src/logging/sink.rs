//! # Log sinks.
//!
//! [`LogSink`] is the collaborator that receives aggregated worker records.
//! [`TracingSink`] re-emits them as `tracing` events with the worker identity as
//! a structured field.

use async_trait::async_trait;

use crate::logging::{Level, LogRecord};

/// Destination for aggregated worker logs.
#[async_trait]
pub trait LogSink: Send + Sync + 'static {
    /// One-time setup; called through the controller's [`SinkInit`](crate::SinkInit).
    fn init(&self) {}

    /// Writes one record. Calls never overlap.
    async fn write(&self, record: &LogRecord);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Re-emits worker records through `tracing`.
#[derive(Debug, Default, Clone)]
pub struct TracingSink {
    install_fmt: bool,
}

impl TracingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also installs a `tracing-subscriber` fmt subscriber (honouring `RUST_LOG`)
    /// when the sink is initialised. A subscriber installed elsewhere wins.
    #[must_use]
    pub fn with_fmt() -> Self {
        Self { install_fmt: true }
    }
}

#[async_trait]
impl LogSink for TracingSink {
    fn init(&self) {
        if !self.install_fmt {
            return;
        }
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_err() {
            tracing::debug!("global tracing subscriber already set");
        }
    }

    async fn write(&self, r: &LogRecord) {
        let worker = &*r.worker;
        match r.level {
            Level::Debug => tracing::debug!(target: "ticketvisor::worker", worker, "{}", r.message),
            Level::Info => tracing::info!(target: "ticketvisor::worker", worker, "{}", r.message),
            Level::Warning => tracing::warn!(target: "ticketvisor::worker", worker, "{}", r.message),
            Level::Error => tracing::error!(target: "ticketvisor::worker", worker, "{}", r.message),
            Level::Critical => {
                tracing::error!(target: "ticketvisor::worker", worker, critical = true, "{}", r.message)
            }
        }
    }

    fn name(&self) -> &'static str {
        "TracingSink"
    }
}
