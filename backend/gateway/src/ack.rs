//! Webhook acknowledgment policy.
//!
//! LINE redelivers on non-2xx, so everything except a server that cannot
//! run at all (or an enforced signature check) answers 200.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use meterline_core::{OutcomeSummary, WebhookError};
use serde_json::{Value, json};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acknowledgment {
    /// Empty, unparseable, or event-less body.
    VerificationPing,
    Processed { event_count: usize, summary: OutcomeSummary },
    Rejected(WebhookError),
    /// Something escaped the per-event isolation.
    Unexpected,
}

impl Acknowledgment {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Rejected(WebhookError::Config(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Rejected(WebhookError::Authenticity(_)) => StatusCode::UNAUTHORIZED,
            _ => StatusCode::OK,
        }
    }

    pub fn body(&self) -> Value {
        match self {
            Self::VerificationPing => json!({ "ok": true }),
            Self::Processed { event_count, summary } => json!({
                "ok": true,
                "processed": true,
                "eventCount": event_count,
                "outcomes": summary,
            }),
            Self::Rejected(WebhookError::Config(_)) => json!({ "error": "Server configuration error" }),
            Self::Rejected(WebhookError::Authenticity(_)) => json!({ "error": "invalid signature" }),
            Self::Unexpected => json!({ "ok": true, "error": "Internal error but acknowledged" }),
        }
    }
}

impl IntoResponse for Acknowledgment {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
