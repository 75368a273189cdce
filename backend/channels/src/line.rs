//! LINE Messaging API wire types and their conversion into pipeline events.
//!
//! Decoding is lenient per element: one malformed event never poisons the
//! rest of the batch.

use meterline_core::{Event, EventKind, EventMeta, MessageContent};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LineEvent {
    #[serde(rename = "type", default)]
    event_type: String,
    reply_token: Option<String>,
    message: Option<LineMessage>,
    source: Option<LineSource>,
    webhook_event_id: Option<String>,
    timestamp: Option<i64>,
    delivery_context: Option<LineDeliveryContext>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LineMessage {
    #[serde(rename = "type", default)]
    kind: String,
    id: Option<String>,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LineSource {
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LineDeliveryContext {
    #[serde(default)]
    is_redelivery: bool,
}

impl From<LineEvent> for Event {
    fn from(ev: LineEvent) -> Self {
        let kind = match ev.event_type.as_str() {
            "message" => EventKind::Message,
            other => EventKind::Other(other.to_string()),
        };
        let message = ev.message.map(MessageContent::from);
        Event {
            kind,
            reply_token: ev.reply_token.filter(|t| !t.trim().is_empty()),
            message,
            meta: EventMeta {
                webhook_event_id: ev.webhook_event_id,
                user_id: ev.source.and_then(|s| s.user_id),
                timestamp: ev.timestamp,
                redelivery: ev.delivery_context.is_some_and(|d| d.is_redelivery),
            },
        }
    }
}

impl From<LineMessage> for MessageContent {
    fn from(msg: LineMessage) -> Self {
        match (msg.kind.as_str(), msg.text, msg.id) {
            ("text", Some(text), _) => MessageContent::Text { text },
            ("image", _, Some(id)) if !id.is_empty() => MessageContent::Image { id },
            (kind, _, _) => MessageContent::Other { kind: kind.to_string() },
        }
    }
}

/// Decode one element of the `events` array.
pub fn decode_event(value: &Value) -> Event {
    match LineEvent::deserialize(value) {
        Ok(ev) => ev.into(),
        Err(_) => {
            let kind = value.get("type").and_then(Value::as_str).unwrap_or("malformed");
            Event::unrecognized(kind)
        }
    }
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(crate) struct ReplyMessage<'a> {
    #[serde(rename = "type")]
    pub message_type: &'static str,
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReplyRequest<'a> {
    pub reply_token: &'a str,
    pub messages: Vec<ReplyMessage<'a>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_text_message_event() {
        let ev = decode_event(&json!({
            "type": "message",
            "replyToken": "t1",
            "webhookEventId": "01FZ74A0TDDPYRVKNK77XKC3ZR",
            "deliveryContext": {"isRedelivery": true},
            "timestamp": 1625665242211_i64,
            "source": {"type": "user", "userId": "U4af498"},
            "message": {"type": "text", "id": "444573844083572737", "text": "hello"}
        }));
        assert_eq!(ev.kind, EventKind::Message);
        assert_eq!(ev.reply_token.as_deref(), Some("t1"));
        assert_eq!(ev.message, Some(MessageContent::Text { text: "hello".into() }));
        assert_eq!(ev.meta.user_id.as_deref(), Some("U4af498"));
        assert!(ev.meta.redelivery);
    }

    #[test]
    fn decodes_image_message_event() {
        let ev = decode_event(&json!({
            "type": "message",
            "replyToken": "t2",
            "message": {"type": "image", "id": "354718705033693861"}
        }));
        assert_eq!(ev.message, Some(MessageContent::Image { id: "354718705033693861".into() }));
    }

    #[test]
    fn image_without_id_is_other() {
        let ev = decode_event(&json!({"type": "message", "message": {"type": "image"}}));
        assert_eq!(ev.message, Some(MessageContent::Other { kind: "image".into() }));
    }

    #[test]
    fn blank_reply_token_is_absent() {
        let ev = decode_event(&json!({
            "type": "message",
            "replyToken": "",
            "message": {"type": "text", "text": "hi"}
        }));
        assert!(ev.reply_token.is_none());
    }

    #[test]
    fn non_object_element_is_unrecognized() {
        let ev = decode_event(&json!(42));
        assert_eq!(ev.kind, EventKind::Other("malformed".into()));

        let ev = decode_event(&json!({"type": "follow", "replyToken": 7}));
        assert_eq!(ev.kind, EventKind::Other("follow".into()));
        assert!(ev.message.is_none());
    }

    #[test]
    fn reply_request_wire_shape() {
        let req = ReplyRequest {
            reply_token: "t1",
            messages: vec![ReplyMessage { message_type: "text", text: "hi" }],
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"replyToken": "t1", "messages": [{"type": "text", "text": "hi"}]})
        );
    }
}
