use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::sink::LogSink;
use crate::time::Sleeper;

/// Severity of a captured line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkLevel {
    Warn,
    Fatal,
}

/// Line captured by a [`RecordingSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkRecord {
    pub level: SinkLevel,
    pub line: String,
}

/// Sink keeping every line in memory
///
/// Clones share storage: hand one clone to the configuration and inspect the
/// other after the run.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    records: Arc<Mutex<Vec<SinkRecord>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every captured line in arrival order
    pub fn records(&self) -> Vec<SinkRecord> {
        self.records.lock().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.lines_at(SinkLevel::Warn)
    }

    pub fn fatals(&self) -> Vec<String> {
        self.lines_at(SinkLevel::Fatal)
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }

    fn lines_at(&self, level: SinkLevel) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .filter(|record| record.level == level)
            .map(|record| record.line.clone())
            .collect()
    }

    fn push(&self, level: SinkLevel, line: &str) {
        self.records.lock().push(SinkRecord { level, line: line.to_string() });
    }
}

impl LogSink for RecordingSink {
    fn warn(&self, line: &str) {
        self.push(SinkLevel::Warn, line);
    }

    fn fatal(&self, line: &str) {
        self.push(SinkLevel::Fatal, line);
    }
}

/// Sleeper that records each requested wait and returns immediately
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    waits: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().clone()
    }

    /// Sum of every requested wait
    pub fn total(&self) -> Duration {
        self.waits.lock().iter().fold(Duration::ZERO, |acc, wait| acc.saturating_add(*wait))
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.waits.lock().push(duration);
    }
}
