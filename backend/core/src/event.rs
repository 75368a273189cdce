use std::fmt;

use serde::Serialize;

/// One HTTP delivery's worth of platform events, in delivery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookBatch {
    pub events: Vec<Event>,
}

impl WebhookBatch {
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// A single inbound platform event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    /// Absent for synthetic/test events; no reply can be sent without it.
    pub reply_token: Option<String>,
    pub message: Option<MessageContent>,
    pub meta: EventMeta,
}

impl Event {
    pub fn message(reply_token: Option<&str>, content: MessageContent) -> Self {
        Self {
            kind: EventKind::Message,
            reply_token: reply_token.map(str::to_owned),
            message: Some(content),
            meta: EventMeta::default(),
        }
    }

    /// Placeholder for an element of `events` that could not be decoded.
    pub fn unrecognized(kind: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Other(kind.into()),
            reply_token: None,
            message: None,
            meta: EventMeta::default(),
        }
    }

    pub fn message_type(&self) -> &str {
        self.message.as_ref().map(MessageContent::type_name).unwrap_or("none")
    }
}

/// Informational fields carried for logging only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventMeta {
    pub webhook_event_id: Option<String>,
    pub user_id: Option<String>,
    pub timestamp: Option<i64>,
    pub redelivery: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Message,
    Other(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Message => "message",
            EventKind::Other(kind) => kind,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    Text { text: String },
    Image { id: String },
    /// Stickers, video, audio, location, or anything we don't handle.
    Other { kind: String },
}

impl MessageContent {
    pub fn type_name(&self) -> &str {
        match self {
            MessageContent::Text { .. } => "text",
            MessageContent::Image { .. } => "image",
            MessageContent::Other { kind } => kind,
        }
    }
}

/// Why an event produced no reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoReplyToken,
    UnsupportedEvent(String),
    UnsupportedMessage(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoReplyToken => f.write_str("no reply token"),
            SkipReason::UnsupportedEvent(kind) => write!(f, "unsupported event type: {kind}"),
            SkipReason::UnsupportedMessage(kind) => write!(f, "unsupported message type: {kind}"),
        }
    }
}

/// Per-event result. Observability only: never folded into the HTTP status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Replied,
    Skipped(SkipReason),
    Failed(String),
}

impl EventOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            EventOutcome::Replied => "replied",
            EventOutcome::Skipped(_) => "skipped",
            EventOutcome::Failed(_) => "failed",
        }
    }
}

/// Outcome counts reported in the acknowledgment body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeSummary {
    pub replied: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl OutcomeSummary {
    pub fn tally(outcomes: &[EventOutcome]) -> Self {
        outcomes.iter().fold(Self::default(), |mut acc, outcome| {
            match outcome {
                EventOutcome::Replied => acc.replied += 1,
                EventOutcome::Skipped(_) => acc.skipped += 1,
                EventOutcome::Failed(_) => acc.failed += 1,
            }
            acc
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_type_falls_back_to_none() {
        let ev = Event::unrecognized("follow");
        assert_eq!(ev.message_type(), "none");
        assert_eq!(ev.kind.to_string(), "follow");

        let ev = Event::message(Some("t1"), MessageContent::Image { id: "42".into() });
        assert_eq!(ev.message_type(), "image");
    }

    #[test]
    fn tally_counts_each_outcome() {
        let outcomes = vec![
            EventOutcome::Replied,
            EventOutcome::Failed("boom".into()),
            EventOutcome::Skipped(SkipReason::NoReplyToken),
            EventOutcome::Replied,
        ];
        let summary = OutcomeSummary::tally(&outcomes);
        assert_eq!(summary, OutcomeSummary { replied: 2, skipped: 1, failed: 1 });
    }

    #[test]
    fn skip_reason_display() {
        assert_eq!(SkipReason::NoReplyToken.to_string(), "no reply token");
        assert_eq!(
            SkipReason::UnsupportedMessage("sticker".into()).to_string(),
            "unsupported message type: sticker"
        );
    }
}
