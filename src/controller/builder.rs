use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::callback::{CallbackNotifier, CallbackTarget};
use crate::config::ControllerConfig;
use crate::controller::core::{Background, Controller};
use crate::error::ControllerError;
use crate::events::Bus;
use crate::logging::{LogAggregator, LogSink, SinkInit, TracingSink};
use crate::subscribers::{Subscribe, SubscriberSet};
use crate::tasks::TaskRef;

/// Builder for a [`Controller`] with optional collaborators.
pub struct ControllerBuilder {
    cfg: ControllerConfig,
    task: TaskRef,
    subscribers: Vec<Arc<dyn Subscribe>>,
    sink: Arc<dyn LogSink>,
    sink_init: Arc<SinkInit>,
    callback_target: Option<Arc<dyn CallbackTarget>>,
}

impl ControllerBuilder {
    pub fn new(cfg: ControllerConfig, task: TaskRef) -> Self {
        Self {
            cfg,
            task,
            subscribers: Vec::new(),
            sink: Arc::new(TracingSink::new()),
            sink_init: Arc::new(SinkInit::new()),
            callback_target: None,
        }
    }

    /// Sets event subscribers.
    ///
    /// Each one gets a dedicated worker with a bounded queue.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Routes worker logs to `sink`.
    ///
    /// `init` guards `sink.init()`; pass the same guard to every controller
    /// sharing the sink so it is initialised once.
    pub fn with_log_sink(mut self, sink: Arc<dyn LogSink>, init: Arc<SinkInit>) -> Self {
        self.sink = sink;
        self.sink_init = init;
        self
    }

    /// Sends start/end notifications to `target` instead of the configured URL.
    ///
    /// Retry settings still come from `cfg.callback`.
    pub fn with_callback_target(mut self, target: Arc<dyn CallbackTarget>) -> Self {
        self.callback_target = Some(target);
        self
    }

    /// Validates the config and starts the controller's background routines.
    ///
    /// # Errors
    /// [`ControllerError::InvalidConfig`] if the config is unusable.
    ///
    /// # Panics
    /// If called outside a Tokio runtime.
    pub fn build(self) -> Result<Arc<Controller>, ControllerError> {
        self.cfg
            .validate()
            .map_err(|reason| ControllerError::InvalidConfig { reason })?;

        let bus = Bus::new(self.cfg.bus_capacity_clamped());

        let mut subscribers = self.subscribers;
        let notifier = match self.callback_target {
            Some(target) => Some(CallbackNotifier::new(target, &self.cfg.callback)),
            None => CallbackNotifier::from_config(&self.cfg.callback),
        };
        if let Some(notifier) = &notifier {
            tracing::info!(
                controller = %self.cfg.name,
                endpoint = notifier.endpoint(),
                "callbacks enabled"
            );
            subscribers.push(Arc::new(notifier.clone()));
        }

        let listener_token = CancellationToken::new();
        let listener = subscriber_listener(
            &bus,
            SubscriberSet::new(subscribers, bus.clone()),
            listener_token.clone(),
        );
        let aggregator = LogAggregator::spawn(self.sink, &self.sink_init);

        let ctrl = Arc::new(Controller::new_internal(
            self.cfg,
            self.task,
            bus,
            Background {
                aggregator,
                listener_token,
                listener,
                notifier,
            },
        ));
        tokio::spawn(Arc::clone(&ctrl).admission_loop());

        tracing::info!(
            controller = %ctrl.name(),
            max_concurrency = ctrl.config().max_concurrency,
            "controller started"
        );
        Ok(ctrl)
    }
}

/// Forwards bus events to the subscriber set until `token` fires, then drains
/// what is already buffered and waits for subscribers to finish.
fn subscriber_listener(bus: &Bus, set: SubscriberSet, token: CancellationToken) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                res = rx.recv() => match res {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "event listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = token.cancelled() => break,
            }
        }
        set.shutdown().await;
    })
}
