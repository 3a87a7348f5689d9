//! View lifecycle binding
//!
//! Ties the binder and dispatcher to a role-scoped view: mounting binds
//! the session and subscribes the dispatcher, unmounting detaches the
//! dispatcher and releases this view's binding. Teardown is scoped to the
//! view: a second view mounted on another role (or the same role) keeps
//! its connection until its own release.

use crate::binder::SessionBinder;
use crate::connection::Connection;
use crate::dispatcher::{DispatcherHandle, EventDispatcher};
use std::sync::Arc;
use tracing::debug;
use trellis_core::{Role, ToastSink};

/// A mounted role-scoped view's hold on the realtime layer
#[derive(Debug)]
pub struct LiveView {
    role: Role,
    binder: Arc<SessionBinder>,
    connection: Arc<Connection>,
    dispatcher: Option<DispatcherHandle>,
}

impl LiveView {
    /// Mount: bind the session, then subscribe the dispatcher
    ///
    /// `user_id` selects the per-user room; without it the connection is
    /// opened but no room is joined.
    pub fn mount(
        binder: Arc<SessionBinder>,
        role: Role,
        user_id: Option<&str>,
        sink: Arc<dyn ToastSink>,
    ) -> Self {
        debug!("Mounting {} view", role);
        let connection = binder.bind(role, user_id);
        let dispatcher = EventDispatcher::attach(&connection, sink);

        Self {
            role,
            binder,
            connection,
            dispatcher: Some(dispatcher),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// The shared connection this view is bound to
    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    /// Connection state as observed by this view's dispatcher
    pub fn is_connected(&self) -> bool {
        self.dispatcher
            .as_ref()
            .map(|d| d.is_connected())
            .unwrap_or(false)
    }

    /// Unmount: unsubscribe and release this view's binding
    pub fn unmount(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if let Some(dispatcher) = self.dispatcher.take() {
            debug!("Unmounting {} view", self.role);
            dispatcher.detach();
            self.binder.release(self.role);
        }
    }
}

impl Drop for LiveView {
    fn drop(&mut self) {
        // A dropped view must not leak its subscription or binding.
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ConnectionRegistry;
    use std::time::Duration;
    use trellis_core::{ConversionPayload, MemoryToastSink, ServerEvent};

    fn test_binder() -> Arc<SessionBinder> {
        Arc::new(SessionBinder::new(Arc::new(
            ConnectionRegistry::with_base_url("http://localhost:4000"),
        )))
    }

    #[tokio::test]
    async fn test_mount_binds_and_subscribes() {
        let binder = test_binder();
        let conn = binder.registry().get(Role::Publisher);
        let mut outbound = conn.take_outbound().unwrap();
        let sink = Arc::new(MemoryToastSink::new());

        let view = LiveView::mount(binder.clone(), Role::Publisher, Some("42"), sink.clone());

        assert!(view.connection().is_open());
        assert!(outbound.try_recv().is_ok());

        view.connection()
            .ingest(ServerEvent::ConversionNew(ConversionPayload {
                conversion_id: Some("cv-1".to_string()),
            }));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(sink.len(), 1);

        view.unmount();
        assert!(!conn.is_open());
    }

    #[tokio::test]
    async fn test_unmount_stops_toasts() {
        let binder = test_binder();
        let conn = binder.registry().get(Role::Admin);
        let _outbound = conn.take_outbound();
        let sink = Arc::new(MemoryToastSink::new());

        let view = LiveView::mount(binder.clone(), Role::Admin, Some("1"), sink.clone());
        view.unmount();

        conn.ingest(ServerEvent::ConversionNew(ConversionPayload::default()));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_drop_releases_binding() {
        let binder = test_binder();
        let conn = binder.registry().get(Role::Advertiser);
        let _outbound = conn.take_outbound();
        let sink = Arc::new(MemoryToastSink::new());

        {
            let _view = LiveView::mount(binder.clone(), Role::Advertiser, Some("9"), sink);
            assert_eq!(binder.bind_count(Role::Advertiser), 1);
        }

        assert_eq!(binder.bind_count(Role::Advertiser), 0);
        assert!(!conn.is_open());
    }
}
