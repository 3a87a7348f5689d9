//! Toast notifications
//!
//! A toast is a transient, auto-dismissing UI notification. Rendering and
//! dismissal timers live in the UI layer; this module only defines the
//! entity and the sink boundary the event dispatcher pushes into.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tokio::sync::mpsc;

/// Visual weight of a toast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational notice
    Info,
    /// Neutral/default styling
    Default,
    /// Error or destructive outcome
    Destructive,
}

/// A transient user-facing notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Toast {
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
}

impl Toast {
    pub fn new(title: impl Into<String>, description: impl Into<String>, severity: Severity) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity,
            created_at: Utc::now(),
        }
    }
}

/// Boundary to the toast-rendering subsystem
///
/// Implementations must not block; a sink that cannot accept a toast drops
/// it silently (toasts are loss-tolerant).
pub trait ToastSink: Send + Sync {
    fn push(&self, toast: Toast);
}

/// Sink that forwards toasts to a UI channel
#[derive(Debug, Clone)]
pub struct ChannelToastSink {
    tx: mpsc::UnboundedSender<Toast>,
}

impl ChannelToastSink {
    /// Create a sink together with the receiving end for the UI loop
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Toast>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ToastSink for ChannelToastSink {
    fn push(&self, toast: Toast) {
        // Receiver gone means the UI is shutting down; nothing to surface.
        let _ = self.tx.send(toast);
    }
}

/// Sink that records every toast, for tests and demos
#[derive(Debug, Default)]
pub struct MemoryToastSink {
    toasts: Mutex<Vec<Toast>>,
}

impl MemoryToastSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all toasts pushed so far
    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().map(|t| t.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.toasts.lock().map(|t| t.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ToastSink for MemoryToastSink {
    fn push(&self, toast: Toast) {
        if let Ok(mut toasts) = self.toasts.lock() {
            toasts.push(toast);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_records() {
        let sink = MemoryToastSink::new();
        sink.push(Toast::new("New conversion", "cv-1", Severity::Info));
        sink.push(Toast::new("Rejected", "cv-2", Severity::Destructive));
        let toasts = sink.toasts();
        assert_eq!(toasts.len(), 2);
        assert_eq!(toasts[0].severity, Severity::Info);
        assert_eq!(toasts[1].severity, Severity::Destructive);
    }

    #[test]
    fn test_channel_sink_forwards() {
        tokio_test::block_on(async {
            let (sink, mut rx) = ChannelToastSink::new();
            sink.push(Toast::new("Ticket", "help", Severity::Info));
            let toast = rx.recv().await.unwrap();
            assert_eq!(toast.title, "Ticket");
        });
    }

    #[test]
    fn test_channel_sink_tolerates_closed_receiver() {
        let (sink, rx) = ChannelToastSink::new();
        drop(rx);
        sink.push(Toast::new("Lost", "dropped", Severity::Default));
    }
}
