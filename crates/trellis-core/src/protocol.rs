//! Wire protocol
//!
//! JSON message types exchanged over a realtime connection. Outbound
//! messages go client → server, inbound events server → client. Both are
//! adjacently tagged: `{"event": "...", "data": {...}}`.
//!
//! Inbound payload fields are all optional with defaults so that a
//! malformed payload still deserializes; the dispatcher renders a
//! best-effort toast from whatever fields exist.

use serde::{Deserialize, Serialize};

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientMessage {
    /// Declare membership in a per-user room, e.g. `"publisher:42"`.
    /// Fire-and-forget; re-sent on every bind, duplicates are tolerated
    /// by the receiving side.
    #[serde(rename = "room:join")]
    RoomJoin { room: String },
}

/// Payload of conversion lifecycle events
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionPayload {
    #[serde(rename = "conversionId", default)]
    pub conversion_id: Option<String>,
}

/// Payload of support ticket events
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TicketPayload {
    #[serde(default)]
    pub subject: Option<String>,
}

/// Events pushed from server to client
///
/// A fixed, closed set. `Connect`/`Disconnect` are structural: they track
/// transport state and never produce a toast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "connect")]
    Connect,
    #[serde(rename = "disconnect")]
    Disconnect,
    #[serde(rename = "conversion:new")]
    ConversionNew(ConversionPayload),
    #[serde(rename = "conversion:approved")]
    ConversionApproved(ConversionPayload),
    #[serde(rename = "conversion:rejected")]
    ConversionRejected(ConversionPayload),
    #[serde(rename = "ticket:new")]
    TicketNew(TicketPayload),
}

impl ServerEvent {
    /// Wire name of the event kind
    pub fn kind(&self) -> &'static str {
        match self {
            ServerEvent::Connect => "connect",
            ServerEvent::Disconnect => "disconnect",
            ServerEvent::ConversionNew(_) => "conversion:new",
            ServerEvent::ConversionApproved(_) => "conversion:approved",
            ServerEvent::ConversionRejected(_) => "conversion:rejected",
            ServerEvent::TicketNew(_) => "ticket:new",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_join_wire_shape() {
        let msg = ClientMessage::RoomJoin {
            room: "admin:42".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"event":"room:join","data":{"room":"admin:42"}}"#);
    }

    #[test]
    fn test_conversion_event_parses() {
        let json = r#"{"event":"conversion:rejected","data":{"conversionId":"cv-9"}}"#;
        let event: ServerEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            ServerEvent::ConversionRejected(ConversionPayload {
                conversion_id: Some("cv-9".to_string()),
            })
        );
    }

    #[test]
    fn test_missing_payload_fields_default() {
        let json = r#"{"event":"ticket:new","data":{}}"#;
        let event: ServerEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event, ServerEvent::TicketNew(TicketPayload { subject: None }));
    }

    #[test]
    fn test_structural_events_have_no_payload() {
        let event: ServerEvent = serde_json::from_str(r#"{"event":"connect"}"#).unwrap();
        assert_eq!(event, ServerEvent::Connect);
        assert_eq!(serde_json::to_string(&event).unwrap(), r#"{"event":"connect"}"#);
    }

    #[test]
    fn test_unknown_event_kind_rejected() {
        let result = serde_json::from_str::<ServerEvent>(r#"{"event":"payout:new","data":{}}"#);
        assert!(result.is_err());
    }
}
