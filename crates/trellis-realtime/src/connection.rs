//! Realtime connection
//!
//! One websocket channel per role. A `Connection` is a lightweight handle:
//! `open()` spawns a driver task that dials the endpoint and pumps frames,
//! while the handle itself only queues outbound messages and fans inbound
//! events out to subscribers.
//!
//! Messages sent before the transport finishes opening are held in the
//! outbound queue and flushed once the socket is up (buffered-send
//! semantics). Establishment failure is never surfaced as an error: the
//! connected flag simply stays false and no events arrive.

use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, warn};
use trellis_core::{ClientMessage, Role, ServerEvent};

/// Capacity of the inbound event fan-out channel. Subscribers that fall
/// further behind than this lose events (at-most-once delivery).
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A persistent bidirectional channel to one role endpoint
pub struct Connection {
    role: Role,
    url: String,
    /// Open requested; cleared by `close()`
    open: AtomicBool,
    /// Transport handshake completed
    connected: AtomicBool,
    outbound_tx: mpsc::UnboundedSender<ClientMessage>,
    /// Read half of the outbound queue; owned by the driver while it runs
    outbound_rx: Mutex<Option<mpsc::UnboundedReceiver<ClientMessage>>>,
    events: broadcast::Sender<ServerEvent>,
    /// Bumped on every `open()`; a driver whose generation no longer
    /// matches has been superseded and must exit.
    epoch: AtomicU64,
    shutdown: watch::Sender<()>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("role", &self.role)
            .field("url", &self.url)
            .field("open", &self.is_open())
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl Connection {
    /// Create a connection handle for a role endpoint
    ///
    /// With `auto_connect` false (the default everywhere) the connection
    /// stays closed until someone calls `open()`.
    pub fn new(role: Role, url: impl Into<String>, auto_connect: bool) -> Arc<Self> {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (shutdown, _) = watch::channel(());

        let conn = Arc::new(Self {
            role,
            url: url.into(),
            open: AtomicBool::new(false),
            connected: AtomicBool::new(false),
            outbound_tx,
            outbound_rx: Mutex::new(Some(outbound_rx)),
            events,
            epoch: AtomicU64::new(0),
            shutdown,
        });

        if auto_connect {
            conn.open();
        }

        conn
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Endpoint url this connection dials
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether `open()` has been requested and not yet closed
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Whether the transport handshake has completed
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Open the connection; idempotent
    ///
    /// Spawns the driver task on the current tokio runtime. A connection
    /// that fails to establish stays open-but-not-connected; there is no
    /// automatic retry.
    pub fn open(self: &Arc<Self>) {
        if self
            .open
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        debug!("Opening {} connection to {}", self.role, self.url);
        let generation = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let conn = Arc::clone(self);
        tokio::spawn(async move {
            conn.drive(generation).await;
        });
    }

    /// Close the connection; idempotent, immediate, not graceful
    pub fn close(&self) {
        if self
            .open
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        debug!("Closing {} connection", self.role);
        self.connected.store(false, Ordering::SeqCst);
        // Broadcast so every live driver sees the close, not just one.
        let _ = self.shutdown.send(());
    }

    /// Queue an outbound message, fire-and-forget
    ///
    /// The message is flushed once the socket is up; if the connection
    /// never establishes it is silently lost with it.
    pub fn send(&self, message: ClientMessage) {
        if self.outbound_tx.send(message).is_err() {
            debug!("Outbound queue for {} detached, message dropped", self.role);
        }
    }

    /// Subscribe to inbound events in arrival order
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.events.subscribe()
    }

    /// Feed an inbound event to all subscribers
    ///
    /// The driver calls this for every frame; tests call it to simulate
    /// server pushes. Structural `connect`/`disconnect` events also update
    /// the connected flag.
    pub fn ingest(&self, event: ServerEvent) {
        match event {
            ServerEvent::Connect => self.connected.store(true, Ordering::SeqCst),
            ServerEvent::Disconnect => self.connected.store(false, Ordering::SeqCst),
            _ => {}
        }
        // No subscribers is fine; events are loss-tolerant.
        let _ = self.events.send(event);
    }

    /// Detach the read half of the outbound queue
    ///
    /// For external drivers and tests that want to observe outbound
    /// traffic. The built-in driver leaves outbound pumping to the taker
    /// once the half is gone.
    pub fn take_outbound(&self) -> Option<mpsc::UnboundedReceiver<ClientMessage>> {
        self.outbound_rx.lock().ok().and_then(|mut rx| rx.take())
    }

    /// Dial the endpoint and pump frames until closed or superseded
    async fn drive(self: Arc<Self>, generation: u64) {
        // Subscribed before the dial so a close() racing the handshake is
        // still observed once the loop starts.
        let mut shutdown = self.shutdown.subscribe();

        let ws_stream = match connect_async(self.url.as_str()).await {
            Ok((stream, _)) => stream,
            Err(e) => {
                // Not surfaced as an error: observable only as the
                // connected flag staying false.
                warn!("Failed to establish {} connection to {}: {}", self.role, self.url, e);
                return;
            }
        };

        // The connection may have been closed, or closed and reopened,
        // while the dial was in flight. A stale driver drops its socket
        // without touching shared state.
        if !self.is_open() || self.epoch.load(Ordering::SeqCst) != generation {
            debug!("{} driver superseded during dial, discarding socket", self.role);
            return;
        }

        debug!("{} connection to {} established", self.role, self.url);
        let (mut sender, mut receiver) = ws_stream.split();
        self.ingest(ServerEvent::Connect);

        let mut outbound = self.outbound_rx.lock().ok().and_then(|mut rx| rx.take());

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if !self.is_open() || self.epoch.load(Ordering::SeqCst) != generation {
                        let _ = sender.close().await;
                        break;
                    }
                }

                // Flush queued outbound messages
                Some(message) = async {
                    match outbound.as_mut() {
                        Some(rx) => rx.recv().await,
                        None => std::future::pending().await,
                    }
                } => {
                    match serde_json::to_string(&message) {
                        Ok(json) => {
                            if let Err(e) = sender.send(Message::Text(json)).await {
                                warn!("Failed to send on {} connection: {}", self.role, e);
                                break;
                            }
                        }
                        Err(e) => {
                            warn!("Failed to serialize outbound message: {}", e);
                        }
                    }
                }

                // Inbound frames
                frame = receiver.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            match serde_json::from_str::<ServerEvent>(&text) {
                                Ok(event) => self.ingest(event),
                                Err(e) => {
                                    // Unknown event kinds are dropped, not fatal.
                                    debug!("Ignoring unparseable frame on {}: {}", self.role, e);
                                }
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            if sender.send(Message::Pong(data)).await.is_err() {
                                break;
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            debug!("{} connection closed by server", self.role);
                            break;
                        }
                        Some(Err(e)) => {
                            warn!("WebSocket error on {} connection: {}", self.role, e);
                            break;
                        }
                        Some(Ok(_)) => {}
                    }
                }
            }
        }

        // Return the outbound half so a later open() can reuse it.
        if let Some(rx) = outbound {
            if let Ok(mut slot) = self.outbound_rx.lock() {
                *slot = Some(rx);
            }
        }

        // A superseded driver must not clear state a newer one owns.
        if self.epoch.load(Ordering::SeqCst) == generation {
            self.ingest(ServerEvent::Disconnect);
        }
        debug!("{} connection driver stopped", self.role);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::ConversionPayload;

    fn test_connection() -> Arc<Connection> {
        Connection::new(Role::Admin, "ws://localhost:4000/ws/admin", false)
    }

    #[test]
    fn test_new_connection_is_closed() {
        let conn = test_connection();
        assert!(!conn.is_open());
        assert!(!conn.is_connected());
    }

    #[test]
    fn test_send_queues_before_open() {
        let conn = test_connection();
        conn.send(ClientMessage::RoomJoin {
            room: "admin:1".to_string(),
        });

        let mut rx = conn.take_outbound().unwrap();
        let queued = rx.try_recv().unwrap();
        assert_eq!(
            queued,
            ClientMessage::RoomJoin {
                room: "admin:1".to_string()
            }
        );
    }

    #[test]
    fn test_subscribe_receives_ingested_events() {
        let conn = test_connection();
        let mut rx = conn.subscribe();

        let event = ServerEvent::ConversionNew(ConversionPayload {
            conversion_id: Some("cv-1".to_string()),
        });
        conn.ingest(event.clone());

        assert_eq!(rx.try_recv().unwrap(), event);
    }

    #[test]
    fn test_ingest_tracks_connected_flag() {
        let conn = test_connection();
        conn.ingest(ServerEvent::Connect);
        assert!(conn.is_connected());
        conn.ingest(ServerEvent::Disconnect);
        assert!(!conn.is_connected());
    }

    #[test]
    fn test_close_without_open_is_noop() {
        let conn = test_connection();
        conn.close();
        conn.close();
        assert!(!conn.is_open());
    }

    #[test]
    fn test_open_marks_open_even_when_unreachable() {
        // Nothing listens on the endpoint; the dial fails in the driver
        // and the connected flag stays false, but open was requested.
        tokio_test::block_on(async {
            let conn = test_connection();
            conn.open();
            conn.open();
            assert!(conn.is_open());
            assert!(!conn.is_connected());
            conn.close();
            assert!(!conn.is_open());
        });
    }
}
