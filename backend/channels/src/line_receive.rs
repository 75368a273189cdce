//! LINE Webhook Receiver
//!
//! Turns raw webhook bodies into event batches and checks the
//! `x-line-signature` header according to the configured policy.

use axum::http::HeaderMap;
use base64::{Engine, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use meterline_core::{SignaturePolicy, WebhookBatch, WebhookError};
use serde_json::Value;
use sha2::Sha256;
use tracing::{debug, info, warn};

use crate::line::decode_event;

pub const SIGNATURE_HEADER: &str = "x-line-signature";

/// Result of normalizing one webhook body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    Batch(WebhookBatch),
    /// Empty, unparseable, or event-less body. Always acknowledged.
    VerificationPing,
}

/// Parse a webhook body. Never fails: anything that is not a usable
/// `{"events": [...]}` document is a verification ping.
pub fn normalize(body: &[u8], headers: &HeaderMap) -> Normalized {
    debug!(
        bytes = body.len(),
        content_type = headers.get("content-type").and_then(|v| v.to_str().ok()).unwrap_or("-"),
        "Normalizing webhook body"
    );

    if body.iter().all(u8::is_ascii_whitespace) {
        info!("Empty body - verification request");
        return Normalized::VerificationPing;
    }

    let parsed: Value = match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(err) => {
            info!(error = %err, "Body is not JSON - treating as verification request");
            return Normalized::VerificationPing;
        }
    };

    let Some(events) = parsed.get("events").and_then(Value::as_array) else {
        info!("No events array in body");
        return Normalized::VerificationPing;
    };

    Normalized::Batch(WebhookBatch::new(events.iter().map(decode_event).collect()))
}

/// Applies the configured [`SignaturePolicy`] to inbound requests.
#[derive(Clone)]
pub struct SignatureVerifier {
    policy: SignaturePolicy,
    channel_secret: String,
}

impl SignatureVerifier {
    pub fn new(policy: SignaturePolicy, channel_secret: impl Into<String>) -> Self {
        Self { policy, channel_secret: channel_secret.into() }
    }

    pub fn policy(&self) -> SignaturePolicy {
        self.policy
    }

    /// `Err` only under [`SignaturePolicy::Enforce`].
    pub fn check(&self, headers: &HeaderMap, body: &[u8]) -> Result<(), WebhookError> {
        let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());

        match (self.policy, signature) {
            (SignaturePolicy::Disabled, None) => {
                debug!("No signature header - could be a test request");
                Ok(())
            }
            (SignaturePolicy::Disabled, Some(_)) => {
                debug!("Signature header present; verification disabled");
                Ok(())
            }
            (SignaturePolicy::Advisory, None) => {
                warn!("No signature header; proceeding (advisory policy)");
                Ok(())
            }
            (SignaturePolicy::Advisory, Some(sig)) => {
                if !verify_signature(&self.channel_secret, sig, body) {
                    warn!("Signature mismatch; proceeding (advisory policy)");
                }
                Ok(())
            }
            (SignaturePolicy::Enforce, None) => {
                warn!("Missing signature header - rejecting webhook");
                Err(WebhookError::Authenticity("missing signature".into()))
            }
            (SignaturePolicy::Enforce, Some(sig)) => {
                if verify_signature(&self.channel_secret, sig, body) {
                    Ok(())
                } else {
                    warn!("Invalid signature - rejecting webhook");
                    Err(WebhookError::Authenticity("invalid signature".into()))
                }
            }
        }
    }
}

/// `signature == base64(HMAC-SHA256(channel_secret, body))`, compared in
/// constant time.
pub fn verify_signature(channel_secret: &str, signature: &str, body: &[u8]) -> bool {
    let Ok(expected) = STANDARD.decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(channel_secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Counterpart of [`verify_signature`], for clients and tests.
pub fn sign_body(channel_secret: &str, body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(channel_secret.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(body);
    STANDARD.encode(mac.finalize().into_bytes())
}
