//! Log Redaction
//!
//! Scrubs bearer tokens, reply tokens, and secrets from strings prior to logging.

use once_cell::sync::Lazy;
use regex::Regex;

static BEARER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Bearer\s+[a-zA-Z0-9\-\._~+/]+=*").unwrap());
static REPLY_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""replyToken"\s*:\s*"[^"]*""#).unwrap());

/// Longest body excerpt written to the log.
const BODY_PREVIEW_CHARS: usize = 512;

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = BEARER_RE.replace_all(input, "Bearer [REDACTED_TOKEN]");
    REPLY_TOKEN_RE
        .replace_all(&redacted, r#""replyToken":"[REDACTED]""#)
        .into_owned()
}

/// Redacted, length-bounded view of a request body.
pub fn preview_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let redacted = redact_sensitive_data(&text);
    match redacted.char_indices().nth(BODY_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}…", &redacted[..cut]),
        None => redacted,
    }
}

/// Show only the last four characters of a secret.
pub fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 8 {
        return "****".to_string();
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("****{tail}")
}
