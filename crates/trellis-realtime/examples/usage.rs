//! trellis-realtime usage example
//!
//! Run: cargo run --example usage
//!
//! Mounts a publisher view against the configured endpoint and prints
//! every toast the dispatcher produces. Without a server listening the
//! view simply never reports connected.

use std::sync::Arc;
use std::time::Duration;
use trellis_config::RealtimeConfig;
use trellis_core::{ChannelToastSink, Role};
use trellis_realtime::{init_global, ConnectionRegistry, LiveView, SessionBinder};

#[tokio::main]
async fn main() {
    trellis_config::init_logging(&trellis_config::LoggingConfig::default());

    // One-time startup configuration: auto-connect stays disabled, views
    // open their connection when they bind.
    let config = RealtimeConfig::from_env();
    init_global(&config);

    let registry = Arc::new(ConnectionRegistry::new(&config));
    let binder = Arc::new(SessionBinder::new(registry));
    let (sink, mut toasts) = ChannelToastSink::new();

    let view = LiveView::mount(binder, Role::Publisher, Some("42"), Arc::new(sink));
    println!("Mounted publisher view against {}", view.connection().url());

    tokio::select! {
        _ = async {
            while let Some(toast) = toasts.recv().await {
                println!("[{:?}] {}: {}", toast.severity, toast.title, toast.description);
            }
        } => {}
        _ = tokio::time::sleep(Duration::from_secs(10)) => {
            println!("Done (connected: {})", view.is_connected());
        }
    }

    view.unmount();
}
