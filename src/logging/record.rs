use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

/// Severity of a worker log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Level {
    /// Upper-case label, as printed by sinks.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One log line produced by a worker.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub level: Level,
    pub message: String,
    /// Worker identity (`"<task>-<instance>"`).
    pub worker: Arc<str>,
    pub timestamp: SystemTime,
}

impl LogRecord {
    pub fn new(level: Level, message: impl Into<String>, worker: Arc<str>) -> Self {
        Self {
            level,
            message: message.into(),
            worker,
            timestamp: SystemTime::now(),
        }
    }
}
