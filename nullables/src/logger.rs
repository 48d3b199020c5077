//! Nullable logger — record facade calls instead of emitting them.

use std::sync::{Arc, Mutex};

use peerlink_network::{LogLevel, Logger};

/// A logger that keeps every message it receives, tagged with its level.
///
/// Clones share the same record, so a test can hand [`RecordingLogger::logger`]
/// to a node and keep the recorder for assertions.
#[derive(Clone, Default)]
pub struct RecordingLogger {
    records: Arc<Mutex<Vec<(LogLevel, String)>>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// A facade with all six slots feeding this recorder.
    pub fn logger(&self) -> Logger {
        LogLevel::ALL
            .into_iter()
            .fold(Logger::builder(), |builder, level| {
                let records = Arc::clone(&self.records);
                builder.slot(level, move |msg| {
                    records
                        .lock()
                        .unwrap_or_else(|poisoned| poisoned.into_inner())
                        .push((level, msg.to_string()))
                })
            })
            .build()
    }

    /// All records so far, oldest first.
    pub fn records(&self) -> Vec<(LogLevel, String)> {
        self.lock().clone()
    }

    /// Messages logged at `level`, oldest first.
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, msg)| msg.clone())
            .collect()
    }

    pub fn count(&self, level: LogLevel) -> usize {
        self.lock().iter().filter(|(l, _)| *l == level).count()
    }

    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.lock()
            .iter()
            .any(|(l, msg)| *l == level && msg.contains(needle))
    }

    /// Clear all state.
    pub fn reset(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(LogLevel, String)>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
