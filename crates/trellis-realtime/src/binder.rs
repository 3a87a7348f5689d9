//! Session binder
//!
//! Ensures a role's connection is open and has announced membership in the
//! per-user room. Binds are reference-counted per role so that teardown
//! can be scoped to the views that actually released their binding,
//! instead of closing every role's connection at once.

use crate::connection::Connection;
use crate::registry::ConnectionRegistry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;
use trellis_core::{ClientMessage, Role};

/// Binds role-scoped views onto shared connections
#[derive(Debug)]
pub struct SessionBinder {
    registry: Arc<ConnectionRegistry>,
    /// Active bind count per role
    bound: DashMap<Role, usize>,
}

impl SessionBinder {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            registry,
            bound: DashMap::new(),
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Open the role's connection and join the user's room
    ///
    /// Fire-and-forget: returns as soon as the open was requested and the
    /// join declaration is queued; callers needing readiness observe the
    /// connection's `connect` event. The join is re-sent on every bind,
    /// even for a room already joined; the receiving side tolerates
    /// duplicates. Without a `user_id` the connection is opened and no
    /// join is sent.
    pub fn bind(&self, role: Role, user_id: Option<&str>) -> Arc<Connection> {
        let conn = self.registry.get(role);
        conn.open();

        if let Some(user_id) = user_id {
            let room = role.room(user_id);
            debug!("Joining room {}", room);
            conn.send(ClientMessage::RoomJoin { room });
        }

        *self.bound.entry(role).or_insert(0) += 1;
        conn
    }

    /// Release one binding for a role
    ///
    /// The role's connection is closed once its last binding is released;
    /// other roles are never touched. Releasing a role with no active
    /// binding is a no-op.
    pub fn release(&self, role: Role) {
        let close = match self.bound.get_mut(&role) {
            Some(mut count) => {
                *count = count.saturating_sub(1);
                *count == 0
            }
            None => false,
        };

        if close {
            self.bound.remove(&role);
            debug!("Last {} binding released, closing connection", role);
            self.registry.close(role);
        }
    }

    /// Active bind count for a role
    pub fn bind_count(&self, role: Role) -> usize {
        self.bound.get(&role).map(|count| *count).unwrap_or(0)
    }

    /// Drop every binding and close all connections
    ///
    /// The blunt global teardown primitive; scoped `release` is what view
    /// unmount uses.
    pub fn close_all(&self) {
        self.bound.clear();
        self.registry.close_all();
    }
}
