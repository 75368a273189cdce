//! LINE webhook endpoint.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
};
use futures::FutureExt;
use meterline_channels::{LineClient, LineClientConfig, Normalized, SignatureVerifier, normalize};
use meterline_config::{LineCredentials, MeterlineConfig};
use meterline_core::{ConfigError, OutcomeSummary};
use meterline_logging::preview_body;
use meterline_understanding::{OcrExtractor, ReadingParser, ReplyTemplates, TesseractEngine};
use serde_json::{Value, json};
use tracing::{Instrument, debug, error, info, info_span};
use uuid::Uuid;

use crate::ack::Acknowledgment;
use crate::dispatch::EventRouter;

/// Everything needed to answer a delivery once credentials are known.
pub struct Pipeline {
    verifier: SignatureVerifier,
    router: Arc<EventRouter>,
}

impl Pipeline {
    pub fn new(verifier: SignatureVerifier, router: Arc<EventRouter>) -> Self {
        Self { verifier, router }
    }

    /// Pings are acknowledged before the signature is looked at; only a
    /// batch that would be dispatched is subject to the signature policy.
    pub async fn handle(&self, headers: &HeaderMap, body: &[u8]) -> Acknowledgment {
        match normalize(body, headers) {
            Normalized::VerificationPing => Acknowledgment::VerificationPing,
            Normalized::Batch(batch) => {
                if let Err(err) = self.verifier.check(headers, body) {
                    return Acknowledgment::Rejected(err);
                }
                let event_count = batch.len();
                info!(event_count, "Processing events");
                let outcomes = Arc::clone(&self.router).process(batch).await;
                let summary = OutcomeSummary::tally(&outcomes);
                info!(
                    replied = summary.replied,
                    skipped = summary.skipped,
                    failed = summary.failed,
                    "All events processed"
                );
                Acknowledgment::Processed { event_count, summary }
            }
        }
    }
}

pub enum Readiness {
    Ready(Pipeline),
    /// The process serves probes but refuses deliveries.
    Misconfigured(ConfigError),
}

#[derive(Clone)]
pub struct WebhookState {
    readiness: Arc<Readiness>,
}

impl WebhookState {
    pub fn ready(pipeline: Pipeline) -> Self {
        Self { readiness: Arc::new(Readiness::Ready(pipeline)) }
    }

    pub fn misconfigured(err: ConfigError) -> Self {
        Self { readiness: Arc::new(Readiness::Misconfigured(err)) }
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.readiness, Readiness::Ready(_))
    }

    /// Wire the LINE client, tesseract, and reply templates from config.
    pub fn from_config(config: &MeterlineConfig, credentials: Result<LineCredentials, ConfigError>) -> Self {
        let credentials = match credentials {
            Ok(credentials) => credentials,
            Err(err) => {
                error!(error = %err, "LINE credentials unavailable; webhook deliveries will be refused");
                return Self::misconfigured(err);
            }
        };

        let client = LineClient::new(LineClientConfig {
            channel_access_token: credentials.channel_access_token,
            api_base: config.line.api_base.clone(),
            data_api_base: config.line.data_api_base.clone(),
        });
        let engine = TesseractEngine::new(config.ocr.tesseract_path.clone());
        let extractor = OcrExtractor::new(Arc::new(engine)).with_max_image_bytes(config.ocr.max_image_bytes);
        let templates = ReplyTemplates::new(config.replies.locale);
        let parser = ReadingParser::new(templates, config.replies.preview_chars);

        let router = EventRouter::new(Arc::new(client), extractor, parser, templates)
            .with_language(config.ocr.language)
            .with_timeouts(
                Duration::from_secs(config.line.call_timeout_secs),
                Duration::from_secs(config.ocr.timeout_secs),
            );
        let verifier = SignatureVerifier::new(config.line.signature_policy, credentials.channel_secret);

        info!(
            language = %config.ocr.language,
            locale = ?config.replies.locale,
            signature_policy = ?config.line.signature_policy,
            "Webhook pipeline ready"
        );
        Self::ready(Pipeline::new(verifier, Arc::new(router)))
    }
}

/// `GET` on the webhook path: a liveness probe.
pub async fn webhook_get() -> Json<Value> {
    info!("Webhook GET request received");
    Json(json!({ "status": "ok" }))
}

pub async fn webhook_post(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Acknowledgment {
    let span = info_span!("webhook", request_id = %Uuid::new_v4());
    async move {
        info!(bytes = body.len(), "Webhook POST received");
        debug!(body = %preview_body(&body), "Webhook body");

        let pipeline = match state.readiness.as_ref() {
            Readiness::Ready(pipeline) => pipeline,
            Readiness::Misconfigured(err) => {
                error!(error = %err, "Missing LINE credentials");
                return Acknowledgment::Rejected(err.clone().into());
            }
        };
        guarded(pipeline.handle(&headers, &body)).await
    }
    .instrument(span)
    .await
}

/// A panic past the per-event isolation still acknowledges.
async fn guarded(fut: impl Future<Output = Acknowledgment>) -> Acknowledgment {
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(ack) => ack,
        Err(_) => {
            error!("Webhook handler panicked");
            Acknowledgment::Unexpected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};
    use axum::response::{IntoResponse, Response};
    use meterline_channels::{SIGNATURE_HEADER, sign_body};
    use meterline_core::SignaturePolicy;

    use crate::testing::{FakeClient, router_with};

    fn state(client: Arc<FakeClient>, policy: SignaturePolicy) -> WebhookState {
        let verifier = SignatureVerifier::new(policy, "channel-secret");
        WebhookState::ready(Pipeline::new(verifier, router_with(client)))
    }

    async fn post(state: WebhookState, headers: HeaderMap, body: &'static [u8]) -> Response {
        webhook_post(State(state), headers, Bytes::from_static(body)).await.into_response()
    }

    async fn json_body(resp: Response) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn get_reports_ok() {
        let Json(body) = webhook_get().await;
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn empty_body_is_acknowledged_without_side_effects() {
        let client = Arc::new(FakeClient::new());
        let resp = post(state(client.clone(), SignaturePolicy::Disabled), HeaderMap::new(), b"").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await, json!({"ok": true}));
        assert_eq!(client.reply_attempts(), 0);
        assert_eq!(client.fetch_count(), 0);
    }

    #[tokio::test]
    async fn garbage_body_is_acknowledged() {
        let client = Arc::new(FakeClient::new());
        let resp = post(state(client.clone(), SignaturePolicy::Disabled), HeaderMap::new(), b"{oops").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await, json!({"ok": true}));
    }

    #[tokio::test]
    async fn misconfigured_server_refuses_deliveries() {
        let state = WebhookState::misconfigured(ConfigError::MissingVar("LINE_CHANNEL_SECRET".into()));
        assert!(!state.is_ready());
        let resp = post(state, HeaderMap::new(), b"").await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(resp).await, json!({"error": "Server configuration error"}));
    }

    #[tokio::test]
    async fn text_event_is_processed() {
        let client = Arc::new(FakeClient::new());
        let body = br#"{"events":[{"type":"message","replyToken":"T1","message":{"type":"text","text":"hello"}}]}"#;
        let resp = post(state(client.clone(), SignaturePolicy::Disabled), HeaderMap::new(), body).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            json_body(resp).await,
            json!({
                "ok": true,
                "processed": true,
                "eventCount": 1,
                "outcomes": {"replied": 1, "skipped": 0, "failed": 0}
            })
        );
        let replies = client.replies();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].0, "T1");
        assert!(replies[0].1.contains("hello"));
    }

    #[tokio::test]
    async fn one_bad_image_does_not_change_the_acknowledgment() {
        let client = Arc::new(FakeClient::new().with_content("A", b"12").with_content("C", b"34"));
        let body = br#"{"events":[
            {"type":"message","replyToken":"T1","message":{"type":"image","id":"A"}},
            {"type":"message","replyToken":"T2","message":{"type":"image","id":"B"}},
            {"type":"message","replyToken":"T3","message":{"type":"image","id":"C"}}
        ]}"#;
        let resp = post(state(client.clone(), SignaturePolicy::Disabled), HeaderMap::new(), body).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["eventCount"], 3);
        assert_eq!(body["outcomes"], json!({"replied": 2, "skipped": 0, "failed": 1}));
        assert_eq!(client.replies().len(), 3);
    }

    #[tokio::test]
    async fn zero_events_is_processed_batch() {
        let client = Arc::new(FakeClient::new());
        let resp = post(state(client, SignaturePolicy::Disabled), HeaderMap::new(), br#"{"events":[]}"#).await;
        let body = json_body(resp).await;
        assert_eq!(body["processed"], true);
        assert_eq!(body["eventCount"], 0);
    }

    #[tokio::test]
    async fn enforced_signature_rejects_unsigned_delivery() {
        let client = Arc::new(FakeClient::new());
        let body = br#"{"events":[{"type":"message","replyToken":"T1","message":{"type":"text","text":"hi"}}]}"#;
        let resp = post(state(client.clone(), SignaturePolicy::Enforce), HeaderMap::new(), body).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(client.reply_attempts(), 0);
    }

    #[tokio::test]
    async fn enforced_signature_still_acknowledges_pings() {
        let client = Arc::new(FakeClient::new());
        for body in [&b""[..], b"not json", br#"{"destination":"U1"}"#] {
            let state = state(client.clone(), SignaturePolicy::Enforce);
            let resp = webhook_post(State(state), HeaderMap::new(), Bytes::copy_from_slice(body))
                .await
                .into_response();
            assert_eq!(resp.status(), StatusCode::OK);
            assert_eq!(json_body(resp).await, json!({"ok": true}));
        }
        assert_eq!(client.reply_attempts(), 0);
    }

    #[tokio::test]
    async fn enforced_signature_accepts_signed_delivery() {
        let client = Arc::new(FakeClient::new());
        let body: &'static [u8] =
            br#"{"events":[{"type":"message","replyToken":"T1","message":{"type":"text","text":"hi"}}]}"#;
        let mut headers = HeaderMap::new();
        headers.insert(
            SIGNATURE_HEADER,
            HeaderValue::from_str(&sign_body("channel-secret", body)).unwrap(),
        );
        let resp = post(state(client.clone(), SignaturePolicy::Enforce), headers, body).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(client.replies().len(), 1);
    }

    #[tokio::test]
    async fn panic_is_acknowledged() {
        fn explode() -> Acknowledgment {
            panic!("boom")
        }
        let ack = guarded(async { explode() }).await;
        assert_eq!(ack, Acknowledgment::Unexpected);
    }

    #[tokio::test]
    async fn from_config_without_credentials_is_misconfigured() {
        let state = WebhookState::from_config(
            &MeterlineConfig::default(),
            Err(ConfigError::MissingVar("LINE_CHANNEL_TOKEN".into())),
        );
        assert!(!state.is_ready());

        let state = WebhookState::from_config(
            &MeterlineConfig::default(),
            Ok(LineCredentials {
                channel_access_token: "token".into(),
                channel_secret: "secret".into(),
            }),
        );
        assert!(state.is_ready());
    }
}
