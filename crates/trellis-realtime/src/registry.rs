//! Connection registry
//!
//! Process-wide owner of the per-role connections. At most one
//! `Connection` exists per role at any time; `get` is idempotent and
//! lazily constructs with auto-connect disabled.

use crate::connection::Connection;
use dashmap::DashMap;
use std::sync::{Arc, OnceLock};
use tracing::debug;
use trellis_config::RealtimeConfig;
use trellis_core::Role;

/// Registry of the per-role realtime connections
#[derive(Debug)]
pub struct ConnectionRegistry {
    base_url: String,
    auto_connect: bool,
    connections: DashMap<Role, Arc<Connection>>,
}

impl ConnectionRegistry {
    /// Build a registry from realtime configuration
    pub fn new(config: &RealtimeConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            auto_connect: config.auto_connect,
            connections: DashMap::new(),
        }
    }

    /// Build a registry pointed at a base url, auto-connect disabled
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auto_connect: false,
            connections: DashMap::new(),
        }
    }

    /// Origin shared by all role endpoints
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the connection for a role, constructing it on first request
    ///
    /// Repeated calls with the same role return the identical instance;
    /// a second connection per role is never allocated.
    pub fn get(&self, role: Role) -> Arc<Connection> {
        self.connections
            .entry(role)
            .or_insert_with(|| {
                debug!("Creating {} connection", role);
                Connection::new(role, endpoint_url(&self.base_url, role), self.auto_connect)
            })
            .clone()
    }

    /// Close one role's connection if it is open; absent or already
    /// closed connections are left untouched
    pub fn close(&self, role: Role) {
        if let Some(conn) = self.connections.get(&role) {
            conn.close();
        }
    }

    /// Close every open connection; idempotent, never errors
    pub fn close_all(&self) {
        for entry in self.connections.iter() {
            entry.value().close();
        }
    }

    /// Close everything and forget the connections
    ///
    /// Test lifecycle helper; production code reuses connections for the
    /// life of the process.
    pub fn reset(&self) {
        self.close_all();
        self.connections.clear();
    }

    /// Number of constructed connections
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

static GLOBAL: OnceLock<ConnectionRegistry> = OnceLock::new();

/// One-time process startup configuration of the global registry
///
/// Idempotent: repeat calls return the already-initialized registry and
/// ignore the new config.
pub fn init_global(config: &RealtimeConfig) -> &'static ConnectionRegistry {
    GLOBAL.get_or_init(|| ConnectionRegistry::new(config))
}

/// The process-wide registry, initialized from the environment on first use
pub fn global() -> &'static ConnectionRegistry {
    GLOBAL.get_or_init(|| ConnectionRegistry::new(&RealtimeConfig::from_env()))
}

/// Derive the websocket endpoint for a role from the configured origin
///
/// Http schemes are mapped to their websocket counterparts so the config
/// can carry the same origin the REST layer uses.
pub(crate) fn endpoint_url(base_url: &str, role: Role) -> String {
    let base = base_url.trim_end_matches('/');
    let base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        base.to_string()
    };
    format!("{}{}", base, role.ws_path())
}
