//! Bounded, sequence-numbered run log.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use chrono::Local;
use log::warn;

use crate::scan::LogLevel;

/// One buffered log line.
///
/// Sequence numbers grow monotonically for the lifetime of the buffer and
/// are never reused, not even after [`LogBuffer::clear`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub seq: u64,
    pub text: String,
}

struct Inner {
    lines: VecDeque<LogLine>,
    next_seq: u64,
}

pub struct LogBuffer {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(Inner {
                lines: VecDeque::with_capacity(capacity.min(1024)),
                next_seq: 1,
            }),
        }
    }

    /// Appends a line, evicting the oldest when full. Returns its sequence number.
    pub fn push(&self, text: impl Into<String>) -> u64 {
        let mut inner = self.lock();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        if inner.lines.len() == self.capacity {
            inner.lines.pop_front();
        }
        inner.lines.push_back(LogLine {
            seq,
            text: text.into(),
        });
        seq
    }

    /// The most recent `n` lines, oldest first.
    pub fn tail(&self, n: usize) -> Vec<String> {
        let inner = self.lock();
        let skip = inner.lines.len().saturating_sub(n);
        inner.lines.iter().skip(skip).map(|l| l.text.clone()).collect()
    }

    /// Lines with a sequence number greater than `cursor`, oldest first.
    pub fn since(&self, cursor: u64) -> Vec<LogLine> {
        let inner = self.lock();
        inner
            .lines
            .iter()
            .filter(|l| l.seq > cursor)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.lock().lines.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().lines.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(g) => g,
            Err(poisoned) => {
                warn!("Log buffer lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

/// Formats a run log line as `[HH:MM:SS] [LEVEL] message`.
pub fn format_line(level: LogLevel, message: &str) -> String {
    format!(
        "[{}] [{}] {}",
        Local::now().format("%H:%M:%S"),
        level.as_str(),
        message
    )
}

/// Formats a lifecycle line as `[HH:MM:SS] [SYSTEM] message`.
pub fn format_system_line(message: &str) -> String {
    format!("[{}] [SYSTEM] {}", Local::now().format("%H:%M:%S"), message)
}
