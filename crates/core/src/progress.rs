//! Progress reporting and cooperative cancellation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Caller-supplied sink for progress messages.
///
/// Cancellation is only honoured between pipeline stages.
pub trait ProgressSink: Sync {
    fn info(&self, message: &str);

    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Forwards messages to `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn info(&self, message: &str) {
        tracing::info!("{message}");
    }
}

/// Drops every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn info(&self, _message: &str) {}
}

/// Keeps messages in memory and lets the owner request cancellation.
#[derive(Debug, Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<String>>,
    cancelled: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }
}

impl ProgressSink for RecordingSink {
    fn info(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Emits a message each time another tenth of `total` items is done.
pub(crate) struct ProgressTicker<'a> {
    sink: &'a dyn ProgressSink,
    label: &'static str,
    total: usize,
    next_decile: usize,
}

impl<'a> ProgressTicker<'a> {
    pub(crate) fn new(sink: &'a dyn ProgressSink, label: &'static str, total: usize) -> Self {
        Self {
            sink,
            label,
            total,
            next_decile: 1,
        }
    }

    pub(crate) fn tick(&mut self, done: usize) {
        if self.total == 0 {
            return;
        }
        while self.next_decile <= 10 && done * 10 >= self.next_decile * self.total {
            self.sink
                .info(&format!("{}: {}%", self.label, self.next_decile * 10));
            self.next_decile += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticker_reports_each_decile_once() {
        let sink = RecordingSink::new();
        let mut ticker = ProgressTicker::new(&sink, "Sampling", 20);
        for done in 1..=20 {
            ticker.tick(done);
        }
        ticker.tick(20);
        let messages = sink.messages();
        assert_eq!(messages.len(), 10);
        assert_eq!(messages[0], "Sampling: 10%");
        assert_eq!(messages[9], "Sampling: 100%");
    }

    #[test]
    fn test_recording_sink_cancel() {
        let sink = RecordingSink::new();
        assert!(!sink.is_cancelled());
        sink.cancel();
        assert!(sink.is_cancelled());
        assert!(!NullSink.is_cancelled());
    }
}
