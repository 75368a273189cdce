//! Process health endpoint.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::webhook::WebhookState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: &'static str,
    pub version: &'static str,
    /// `false` when LINE credentials are missing.
    pub webhook_ready: bool,
    pub timestamp: DateTime<Utc>,
}

/// Handler for `GET /api/health`
pub async fn get_health(State(state): State<WebhookState>) -> Json<HealthReport> {
    Json(HealthReport {
        status: if state.is_ready() { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        webhook_ready: state.is_ready(),
        timestamp: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use meterline_core::ConfigError;

    #[tokio::test]
    async fn misconfigured_state_is_degraded() {
        let state = WebhookState::misconfigured(ConfigError::MissingVar("LINE_CHANNEL_TOKEN".into()));
        let Json(report) = get_health(State(state)).await;
        assert_eq!(report.status, "degraded");
        assert!(!report.webhook_ready);
    }
}
