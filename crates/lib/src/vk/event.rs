//! Callback API event payloads.

use serde::Deserialize;
use serde_json::Value;

/// Callback API POST body. Only `type` is meaningful for every event; `object`
/// is decoded per event kind.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundEvent {
    #[serde(rename = "type", default)]
    pub event_type: String,
    #[serde(default)]
    pub group_id: Option<i64>,
    #[serde(default)]
    pub object: Value,
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default)]
    pub event_id: Option<String>,
}

impl InboundEvent {
    /// Parse a request body. When the body carries no `type`, fall back to the
    /// `type` query parameter (VK test pings send it there).
    pub fn from_request(body: &[u8], query_type: Option<&str>) -> Result<Self, serde_json::Error> {
        let mut event: InboundEvent = if body.iter().all(|b| b.is_ascii_whitespace()) {
            InboundEvent::default()
        } else {
            serde_json::from_slice(body)?
        };
        if event.event_type.is_empty() {
            if let Some(t) = query_type {
                event.event_type = t.to_string();
            }
        }
        Ok(event)
    }

    pub fn kind(&self) -> EventKind {
        EventKind::parse(&self.event_type)
    }

    /// Decode `object.message` of a `message_new` event.
    pub fn message(&self) -> Result<InboundMessage, serde_json::Error> {
        let new: MessageNewObject = serde_json::from_value(self.object.clone())?;
        Ok(InboundMessage {
            sender_id: new.message.from_id,
            text: new.message.text.unwrap_or_default(),
        })
    }
}

/// Event classification used by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Confirmation,
    MessageNew,
    /// Known message events the bridge does not act on.
    Ignored,
    Unknown,
}

const IGNORED_EVENTS: &[&str] = &[
    "message_typing_state",
    "message_reply",
    "message_edit",
    "message_allow",
    "message_deny",
    "message_read",
    "message_event",
];

impl EventKind {
    pub fn parse(event_type: &str) -> Self {
        match event_type {
            "confirmation" => EventKind::Confirmation,
            "message_new" => EventKind::MessageNew,
            t if IGNORED_EVENTS.contains(&t) => EventKind::Ignored,
            _ => EventKind::Unknown,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessageNewObject {
    message: MessageObject,
}

#[derive(Debug, Deserialize)]
struct MessageObject {
    from_id: i64,
    #[serde(default)]
    text: Option<String>,
}

/// A user message extracted from `message_new`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub sender_id: i64,
    pub text: String,
}
