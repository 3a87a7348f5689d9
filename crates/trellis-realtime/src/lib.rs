//! Realtime notification core
//!
//! Per-role websocket connections, session binding with room membership,
//! and the event-to-toast dispatch layer.
//!
//! The moving parts:
//! - [`ConnectionRegistry`] owns at most one [`Connection`] per role,
//!   lazily created with auto-connect disabled.
//! - [`SessionBinder`] opens a role's connection and announces the
//!   per-user room, reference-counting binds so teardown stays scoped.
//! - [`EventDispatcher`] converts inbound events into toasts.
//! - [`LiveView`] ties the three to a view's mount/unmount lifecycle.
//!
//! All failure is absorbed into either the connected flag staying false
//! or a user-visible toast; nothing in this crate throws across its
//! public contract.

pub mod binder;
pub mod connection;
pub mod dispatcher;
pub mod registry;
pub mod view;

pub use binder::SessionBinder;
pub use connection::Connection;
pub use dispatcher::{toast_for, DispatcherHandle, EventDispatcher};
pub use registry::{global, init_global, ConnectionRegistry};
pub use view::LiveView;
