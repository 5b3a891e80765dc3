//! Event log sink port.
//!
//! The bridge appends one line per significant event (start, stop, request,
//! selected model, response length, errors). The sink is not exposed to
//! HTTP clients.

use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;

/// Format an event line with its timestamp prefix.
pub fn format_log_line(at: DateTime<Utc>, message: &str) -> String {
    format!("[{}] {message}", at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Port for appending bridge event lines.
///
/// Implementations must be thread-safe and must not block.
pub trait BridgeLogSink: Send + Sync + fmt::Debug {
    /// Append a fully formatted line.
    fn append(&self, line: String);

    /// Record an event, prefixing it with the current time.
    fn record(&self, message: &str) {
        tracing::debug!(target: "lmbridge::events", "{message}");
        self.append(format_log_line(Utc::now(), message));
    }
}

/// Sink that discards every line.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogSink;

impl BridgeLogSink for NoopLogSink {
    fn append(&self, _line: String) {}
}
