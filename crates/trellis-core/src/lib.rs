//! Shared types for the Trellis realtime toolkit
//!
//! Holds the role model, toast notification types, and the wire protocol
//! shared between the realtime core and its collaborators.

pub mod protocol;
pub mod role;
pub mod toast;

pub use protocol::{ClientMessage, ConversionPayload, ServerEvent, TicketPayload};
pub use role::{Role, RoleParseError};
pub use toast::{ChannelToastSink, MemoryToastSink, Severity, Toast, ToastSink};
