//! WebSocket message types: envelope and commands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::SlotId;

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for commands; server-generated for events.
    #[serde(default)]
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp.
    #[serde(default = "chrono::Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl WsMessage {
    /// Builds a server-originated message stamped with the current time.
    #[must_use]
    pub fn new(id: impl Into<String>, msg_type: WsMessageType, payload: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            msg_type,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Builds an error reply.
    #[must_use]
    pub fn error(id: impl Into<String>, code: u16, message: &str) -> Self {
        Self::new(
            id,
            WsMessageType::Error,
            serde_json::json!({ "code": code, "message": message }),
        )
    }
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Client → Server command.
    Command,
    /// Server → Client response to a command.
    Response,
    /// Server → Client broadcast event.
    Event,
    /// Server → Client error.
    Error,
}

/// Commands a client can send in the payload of a `command` message.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WsCommand {
    /// Follow events for specific slots.
    Subscribe {
        /// Slot IDs to follow. `"*"` follows every slot.
        slot_ids: Vec<String>,
    },
    /// Stop following specific slots.
    Unsubscribe {
        /// Slot IDs to drop. `"*"` clears the wildcard.
        slot_ids: Vec<String>,
    },
}

/// Splits raw slot id strings into parsed ids and a wildcard flag.
///
/// Strings that are neither `"*"` nor a UUID are returned as rejected.
#[must_use]
pub fn parse_slot_ids(raw: &[String]) -> (Vec<SlotId>, bool, Vec<String>) {
    let mut ids = Vec::new();
    let mut wildcard = false;
    let mut rejected = Vec::new();
    for s in raw {
        if s == "*" {
            wildcard = true;
        } else if let Ok(id) = s.parse::<SlotId>() {
            ids.push(id);
        } else {
            rejected.push(s.clone());
        }
    }
    (ids, wildcard, rejected)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn command_parses_from_payload() {
        let payload = serde_json::json!({ "command": "subscribe", "slot_ids": ["*"] });
        let Ok(WsCommand::Subscribe { slot_ids }) = serde_json::from_value(payload) else {
            panic!("expected subscribe");
        };
        assert_eq!(slot_ids, vec!["*".to_string()]);
    }

    #[test]
    fn slot_ids_split_into_parsed_wildcard_and_rejected() {
        let id = SlotId::new();
        let raw = vec![id.to_string(), "*".to_string(), "nope".to_string()];
        let (ids, wildcard, rejected) = parse_slot_ids(&raw);
        assert_eq!(ids, vec![id]);
        assert!(wildcard);
        assert_eq!(rejected, vec!["nope".to_string()]);
    }
}
