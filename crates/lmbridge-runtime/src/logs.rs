//! In-memory event trail for the bridge.
//!
//! Lines are kept in a bounded ring buffer and can be read back in-process
//! (for example by a host UI). They are never served over HTTP.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use lmbridge_core::BridgeLogSink;

/// Maximum number of event lines kept before the oldest are dropped.
pub const MAX_LOG_LINES: usize = 5000;

/// Ring buffer sink for bridge event lines.
#[derive(Debug)]
pub struct MemoryLogSink {
    lines: Mutex<VecDeque<String>>,
    capacity: usize,
}

impl Default for MemoryLogSink {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLogSink {
    /// Create a sink holding up to [`MAX_LOG_LINES`] lines.
    pub fn new() -> Self {
        Self::with_capacity(MAX_LOG_LINES)
    }

    /// Create a sink holding up to `capacity` lines (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Snapshot of the retained lines, oldest first.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BridgeLogSink for MemoryLogSink {
    fn append(&self, line: String) {
        let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        if lines.len() >= self.capacity {
            lines.pop_front();
        }
        lines.push_back(line);
    }
}
