//! Driver lifecycle against a local websocket server
//!
//! The server hands accepted sockets back to the test without completing
//! the websocket handshake, so a close() can land while a dial is still
//! in flight.

use futures_util::SinkExt;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use trellis_core::{Role, ServerEvent, TicketPayload};
use trellis_realtime::Connection;

/// Bind a listener and forward raw accepted sockets to the test, which
/// decides when each handshake completes.
async fn gated_server() -> (String, mpsc::UnboundedReceiver<TcpStream>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!(
        "ws://{}{}",
        listener.local_addr().unwrap(),
        Role::Admin.ws_path()
    );
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            if tx.send(stream).is_err() {
                break;
            }
        }
    });
    (url, rx)
}

#[tokio::test]
async fn close_during_dial_never_reports_connected() {
    let (url, mut pending) = gated_server().await;
    let conn = Connection::new(Role::Admin, url, false);
    let mut events = conn.subscribe();

    conn.open();
    let held = pending.recv().await.unwrap();
    conn.close();

    // Releasing the handshake after the close must not bring the
    // connection up; the socket may already be gone on the client side.
    let _ = accept_async(held).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(!conn.is_open());
    assert!(!conn.is_connected());
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn close_during_dial_does_not_resurrect_a_stale_driver() {
    let (url, mut pending) = gated_server().await;
    let conn = Connection::new(Role::Admin, url, false);
    let mut events = conn.subscribe();

    // First dial reaches the server; its handshake is held back.
    conn.open();
    let first = pending.recv().await.unwrap();

    // Close and reopen while that dial is still in flight.
    conn.close();
    conn.open();
    let second = pending.recv().await.unwrap();

    // Release both handshakes. Only the second driver may come up.
    let stale = tokio::spawn(async move { accept_async(first).await });
    let mut live = accept_async(second).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(conn.is_connected());
    assert_eq!(events.recv().await.unwrap(), ServerEvent::Connect);
    assert!(events.try_recv().is_err());

    // A push on the first socket must not reach subscribers.
    if let Ok(Ok(mut ws)) = stale.await {
        let _ = ws
            .send(Message::Text(
                r#"{"event":"ticket:new","data":{"subject":"stale"}}"#.to_string(),
            ))
            .await;
    }
    live.send(Message::Text(
        r#"{"event":"ticket:new","data":{"subject":"live"}}"#.to_string(),
    ))
    .await
    .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(
        events.recv().await.unwrap(),
        ServerEvent::TicketNew(TicketPayload {
            subject: Some("live".to_string()),
        })
    );
    assert!(events.try_recv().is_err());

    // Teardown of the surviving driver still works.
    conn.close();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!conn.is_connected());
}
