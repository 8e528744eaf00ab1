//! # Controller configuration.
//!
//! Provides [`ControllerConfig`] (admission, concurrency, shutdown, event bus)
//! and [`CallbackConfig`] (best-effort notification target and retry knobs).
//!
//! ## Sentinel values
//! - `queue_capacity = 0` → unbounded admission queue
//! - `callback.url = None` → callbacks disabled (unless a target is injected via the builder)
//! - `bus_capacity` is clamped to a minimum of 1

use std::time::Duration;

use crate::policies::{BackoffPolicy, JitterPolicy};

/// Configuration of one [`Controller`](crate::Controller).
///
/// ## Field semantics
/// - `name`: controller name used in logs and the logging wrapper
/// - `max_concurrency`: maximum number of simultaneously active workers (must be `> 0`)
/// - `queue_capacity`: admission queue bound (`0` = unbounded)
/// - `bus_capacity`: event bus ring buffer size (min 1)
/// - `grace`: how long [`Controller::shutdown`](crate::Controller::shutdown) waits for workers
/// - `callback`: notification target and retry settings
#[derive(Clone, Debug)]
pub struct ControllerConfig {
    /// Human-readable controller name.
    pub name: String,

    /// Maximum number of workers running at the same time.
    pub max_concurrency: usize,

    /// Capacity of the admission queue.
    ///
    /// When full, `submit()` fails fast with
    /// [`ControllerError::AdmissionRejected`](crate::ControllerError::AdmissionRejected).
    pub queue_capacity: usize,

    /// Capacity of the event bus broadcast channel.
    pub bus_capacity: usize,

    /// Maximum time shutdown waits for workers to reach a checkpoint.
    pub grace: Duration,

    /// Callback notification settings.
    pub callback: CallbackConfig,
}

impl ControllerConfig {
    /// Creates a config with the given name and concurrency limit; everything else is default.
    pub fn new(name: impl Into<String>, max_concurrency: usize) -> Self {
        Self {
            name: name.into(),
            max_concurrency,
            ..Self::default()
        }
    }

    /// Returns the queue bound as an `Option`.
    ///
    /// - `None` → unbounded
    /// - `Some(n)` → at most `n` queued tickets
    #[inline]
    pub fn queue_limit(&self) -> Option<usize> {
        if self.queue_capacity == 0 {
            None
        } else {
            Some(self.queue_capacity)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Checks the values the controller cannot run without.
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.max_concurrency == 0 {
            return Err("max_concurrency must be greater than 0".to_string());
        }
        if self.callback.attempts == 0 {
            return Err("callback.attempts must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Default for ControllerConfig {
    /// Default configuration:
    ///
    /// - `name = "controller"`
    /// - `max_concurrency = 1`
    /// - `queue_capacity = 0` (unbounded)
    /// - `bus_capacity = 1024`
    /// - `grace = 30s`
    /// - `callback = CallbackConfig::default()` (disabled)
    fn default() -> Self {
        Self {
            name: "controller".to_string(),
            max_concurrency: 1,
            queue_capacity: 0,
            bus_capacity: 1024,
            grace: Duration::from_secs(30),
            callback: CallbackConfig::default(),
        }
    }
}

/// Callback notification settings.
#[derive(Clone, Debug)]
pub struct CallbackConfig {
    /// Endpoint receiving `{"event", "ticketId"}` JSON posts (`None` = disabled).
    pub url: Option<String>,

    /// Total delivery attempts per notification (min 1).
    pub attempts: u32,

    /// Timeout of a single attempt.
    pub timeout: Duration,

    /// Delay between attempts.
    pub backoff: BackoffPolicy,
}

impl CallbackConfig {
    /// Enables HTTP callbacks to `url` with default retry settings.
    pub fn to_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }
}

impl Default for CallbackConfig {
    /// Default settings:
    ///
    /// - `url = None`
    /// - `attempts = 3`
    /// - `timeout = 60s`
    /// - `backoff`: first=200ms, factor=2.0, max=5s, equal jitter
    fn default() -> Self {
        Self {
            url: None,
            attempts: 3,
            timeout: Duration::from_secs(60),
            backoff: BackoffPolicy {
                first: Duration::from_millis(200),
                max: Duration::from_secs(5),
                factor: 2.0,
                jitter: JitterPolicy::Equal,
            },
        }
    }
}
