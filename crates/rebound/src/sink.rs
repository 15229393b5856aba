//! Logging sinks for per-attempt diagnostics
//!
//! The executor hands every failed attempt to a [`LogSink`] as a formatted
//! line, and the abort policy hands it a final fatal line. Sinks are injected
//! per execution; there is no process-wide default instance.
//!
//! Sinks are best-effort. A sink that cannot write must swallow the failure
//! rather than disturb the run.

use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{error, warn};

/// Destination for human-readable progress lines
pub trait LogSink: Send + Sync {
    /// Record a failed attempt
    fn warn(&self, line: &str);

    /// Record the message preceding a fatal abort
    fn fatal(&self, line: &str);
}

impl<T: LogSink + ?Sized> LogSink for Arc<T> {
    fn warn(&self, line: &str) {
        (**self).warn(line)
    }

    fn fatal(&self, line: &str) {
        (**self).fatal(line)
    }
}

impl<T: LogSink + ?Sized> LogSink for Box<T> {
    fn warn(&self, line: &str) {
        (**self).warn(line)
    }

    fn fatal(&self, line: &str) {
        (**self).fatal(line)
    }
}

/// Sink forwarding lines to the `tracing` ecosystem
///
/// Warnings are emitted at WARN, fatal lines at ERROR, both under the
/// `rebound` target so subscribers can filter them.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn warn(&self, line: &str) {
        warn!(target: "rebound", "{line}");
    }

    fn fatal(&self, line: &str) {
        error!(target: "rebound", "{line}");
    }
}

/// Sink writing newline-terminated lines to any [`Write`] destination
///
/// Fatal lines are prefixed with `FATAL: `. Write errors are ignored.
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W: Write> WriterSink<W> {
    /// Sink writing to `writer`
    pub fn new(writer: W) -> Self {
        Self { writer: Mutex::new(writer) }
    }

    /// Recover the underlying writer
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn write_line(&self, prefix: &str, line: &str) {
        let mut writer = self.writer.lock();
        let _ = writeln!(writer, "{prefix}{line}");
        let _ = writer.flush();
    }
}

impl WriterSink<io::Stderr> {
    /// Sink writing to standard error
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write + Send> LogSink for WriterSink<W> {
    fn warn(&self, line: &str) {
        self.write_line("", line);
    }

    fn fatal(&self, line: &str) {
        self.write_line("FATAL: ", line);
    }
}

impl<W> fmt::Debug for WriterSink<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterSink").finish_non_exhaustive()
    }
}

/// Sink that drops every line
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

impl LogSink for DiscardSink {
    fn warn(&self, _line: &str) {}

    fn fatal(&self, _line: &str) {}
}
