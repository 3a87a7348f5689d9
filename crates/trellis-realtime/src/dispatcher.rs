//! Event dispatcher
//!
//! Converts inbound events into toasts via a fixed mapping table and
//! tracks the structural connect/disconnect events. Subscribed once per
//! view on bind, unsubscribed on teardown; between the two it forwards
//! every event in arrival order, at most once, with no buffering beyond
//! the connection's fan-out channel.

use crate::connection::Connection;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::debug;
use trellis_core::{ServerEvent, Severity, Toast, ToastSink};

/// Map an inbound event to its toast, if it produces one
///
/// The mapping is total over the closed event set: structural events map
/// to `None`, everything else always yields a toast. Missing payload
/// fields fall back to defensive defaults rather than failing.
pub fn toast_for(event: &ServerEvent) -> Option<Toast> {
    match event {
        ServerEvent::Connect | ServerEvent::Disconnect => None,
        ServerEvent::ConversionNew(payload) => Some(Toast::new(
            "New conversion",
            format!(
                "Conversion {} has been registered",
                payload.conversion_id.as_deref().unwrap_or("(unknown)")
            ),
            Severity::Info,
        )),
        ServerEvent::ConversionApproved(payload) => Some(Toast::new(
            "Conversion approved",
            format!(
                "Conversion {} has been approved",
                payload.conversion_id.as_deref().unwrap_or("(unknown)")
            ),
            Severity::Default,
        )),
        ServerEvent::ConversionRejected(payload) => Some(Toast::new(
            "Conversion rejected",
            format!(
                "Conversion {} has been rejected",
                payload.conversion_id.as_deref().unwrap_or("(unknown)")
            ),
            Severity::Destructive,
        )),
        ServerEvent::TicketNew(payload) => Some(Toast::new(
            "New support ticket",
            payload.subject.clone().unwrap_or_else(|| "(no subject)".to_string()),
            Severity::Info,
        )),
    }
}

/// Handle to an attached dispatcher
///
/// Dropping the handle detaches the subscription.
#[derive(Debug)]
pub struct DispatcherHandle {
    task: JoinHandle<()>,
    connected: Arc<AtomicBool>,
}

impl DispatcherHandle {
    /// Locally-tracked connection state, driven by the structural events
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Stop forwarding events; idempotent
    pub fn detach(&self) {
        self.task.abort();
    }
}

impl Drop for DispatcherHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// The event-to-toast dispatcher
pub struct EventDispatcher;

impl EventDispatcher {
    /// Subscribe to a connection and forward its events as toasts
    ///
    /// Events are handled in arrival order. A subscriber that lags behind
    /// the fan-out channel loses the missed events; there is no
    /// redelivery.
    pub fn attach(connection: &Arc<Connection>, sink: Arc<dyn ToastSink>) -> DispatcherHandle {
        let mut events = connection.subscribe();
        let connected = Arc::new(AtomicBool::new(connection.is_connected()));
        let flag = Arc::clone(&connected);
        let role = connection.role();

        let task = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(ServerEvent::Connect) => {
                        debug!("{} connection reported connected", role);
                        flag.store(true, Ordering::SeqCst);
                    }
                    Ok(ServerEvent::Disconnect) => {
                        debug!("{} connection reported disconnected", role);
                        flag.store(false, Ordering::SeqCst);
                    }
                    Ok(event) => {
                        if let Some(toast) = toast_for(&event) {
                            sink.push(toast);
                        }
                    }
                    Err(RecvError::Lagged(missed)) => {
                        // At-most-once: missed events are simply never
                        // surfaced.
                        debug!("Dispatcher for {} dropped {} events", role, missed);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        DispatcherHandle { task, connected }
    }
}
