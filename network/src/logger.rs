//! Six-slot, severity-levelled message sink consumed by the node.
//!
//! Every slot is independent and optional. A slot that was never set is a
//! silent no-op when called. The node itself only cares about one rule: a
//! logger without an `info` slot is treated as absent and replaced wholesale
//! by [`Logger::noop`] (slots are never merged one by one).

use std::fmt;
use std::sync::Arc;

/// A single severity sink.
pub type LogFn = Arc<dyn Fn(&str) + Send + Sync>;

/// Severity of a facade call. Mirrors the six slots of [`Logger`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl LogLevel {
    pub const ALL: [LogLevel; 6] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Fatal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logger facade with one callback slot per severity.
///
/// Immutable once built; cloning shares the underlying sinks.
#[derive(Clone, Default)]
pub struct Logger {
    trace: Option<LogFn>,
    debug: Option<LogFn>,
    info: Option<LogFn>,
    warn: Option<LogFn>,
    error: Option<LogFn>,
    fatal: Option<LogFn>,
}

fn noop_sink() -> LogFn {
    fn discard(_message: &str) {}
    Arc::new(discard)
}

impl Logger {
    /// A logger whose six slots all point at one shared no-op sink.
    pub fn noop() -> Self {
        let sink = noop_sink();
        Self {
            trace: Some(sink.clone()),
            debug: Some(sink.clone()),
            info: Some(sink.clone()),
            warn: Some(sink.clone()),
            error: Some(sink.clone()),
            fatal: Some(sink),
        }
    }

    /// A logger that forwards every slot to the matching `tracing` macro.
    pub fn tracing() -> Self {
        Self::builder()
            .trace(|msg| tracing::trace!(target: "peerlink_network::node", "{msg}"))
            .debug(|msg| tracing::debug!(target: "peerlink_network::node", "{msg}"))
            .info(|msg| tracing::info!(target: "peerlink_network::node", "{msg}"))
            .warn(|msg| tracing::warn!(target: "peerlink_network::node", "{msg}"))
            .error(|msg| tracing::error!(target: "peerlink_network::node", "{msg}"))
            .fatal(|msg| tracing::error!(target: "peerlink_network::node", fatal = true, "{msg}"))
            .build()
    }

    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::default()
    }

    /// Whether the `info` slot is populated.
    pub fn has_info(&self) -> bool {
        self.info.is_some()
    }

    pub fn has_slot(&self, level: LogLevel) -> bool {
        self.slot(level).is_some()
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        if let Some(sink) = self.slot(level) {
            sink(message);
        }
    }

    pub fn trace(&self, message: &str) {
        self.log(LogLevel::Trace, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    pub fn fatal(&self, message: &str) {
        self.log(LogLevel::Fatal, message);
    }

    fn slot(&self, level: LogLevel) -> Option<&LogFn> {
        match level {
            LogLevel::Trace => self.trace.as_ref(),
            LogLevel::Debug => self.debug.as_ref(),
            LogLevel::Info => self.info.as_ref(),
            LogLevel::Warn => self.warn.as_ref(),
            LogLevel::Error => self.error.as_ref(),
            LogLevel::Fatal => self.fatal.as_ref(),
        }
    }
}

/// Shorthand for [`Logger::noop`].
pub fn create_default_logger() -> Logger {
    Logger::noop()
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let set: Vec<&str> = LogLevel::ALL
            .iter()
            .filter(|level| self.has_slot(**level))
            .map(|level| level.as_str())
            .collect();
        f.debug_struct("Logger").field("slots", &set).finish()
    }
}

/// Incremental construction of a [`Logger`]; unset slots stay empty.
#[derive(Default)]
pub struct LoggerBuilder {
    inner: Logger,
}

impl LoggerBuilder {
    pub fn slot<F>(mut self, level: LogLevel, sink: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let sink: LogFn = Arc::new(sink);
        match level {
            LogLevel::Trace => self.inner.trace = Some(sink),
            LogLevel::Debug => self.inner.debug = Some(sink),
            LogLevel::Info => self.inner.info = Some(sink),
            LogLevel::Warn => self.inner.warn = Some(sink),
            LogLevel::Error => self.inner.error = Some(sink),
            LogLevel::Fatal => self.inner.fatal = Some(sink),
        }
        self
    }

    pub fn trace<F: Fn(&str) + Send + Sync + 'static>(self, sink: F) -> Self {
        self.slot(LogLevel::Trace, sink)
    }

    pub fn debug<F: Fn(&str) + Send + Sync + 'static>(self, sink: F) -> Self {
        self.slot(LogLevel::Debug, sink)
    }

    pub fn info<F: Fn(&str) + Send + Sync + 'static>(self, sink: F) -> Self {
        self.slot(LogLevel::Info, sink)
    }

    pub fn warn<F: Fn(&str) + Send + Sync + 'static>(self, sink: F) -> Self {
        self.slot(LogLevel::Warn, sink)
    }

    pub fn error<F: Fn(&str) + Send + Sync + 'static>(self, sink: F) -> Self {
        self.slot(LogLevel::Error, sink)
    }

    pub fn fatal<F: Fn(&str) + Send + Sync + 'static>(self, sink: F) -> Self {
        self.slot(LogLevel::Fatal, sink)
    }

    pub fn build(self) -> Logger {
        self.inner
    }
}
