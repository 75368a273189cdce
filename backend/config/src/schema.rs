//! meterline runtime configuration schema.
//!
//! Every field has a default, so an empty YAML document (or no file at all)
//! is a valid configuration. Secrets are not part of this schema; they live
//! in [`LineCredentials`] and come from the environment only.

use std::fmt;
use std::path::PathBuf;

use meterline_core::{LanguageHint, ReplyLocale, SignaturePolicy};
use meterline_logging::mask_secret;
use serde::{Deserialize, Serialize};

use crate::defaults;

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MeterlineConfig {
    pub server: ServerConfig,
    pub line: LineConfig,
    pub ocr: OcrConfig,
    pub replies: RepliesConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    /// Path that receives LINE webhook deliveries (POST) and probes (GET).
    pub webhook_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: defaults::DEFAULT_BIND_ADDRESS.to_string(),
            port: defaults::DEFAULT_PORT,
            webhook_path: defaults::DEFAULT_WEBHOOK_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LineConfig {
    /// Base URL of the Messaging API (reply endpoint).
    pub api_base: String,
    /// Base URL of the content API (message content downloads).
    pub data_api_base: String,
    pub signature_policy: SignaturePolicy,
    /// Upper bound for each content download and reply call.
    pub call_timeout_secs: u64,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            api_base: defaults::LINE_API_BASE.to_string(),
            data_api_base: defaults::LINE_DATA_API_BASE.to_string(),
            signature_policy: SignaturePolicy::default(),
            call_timeout_secs: defaults::DEFAULT_CALL_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OcrConfig {
    pub language: LanguageHint,
    /// `tesseract` binary, resolved through `PATH` when not absolute.
    pub tesseract_path: String,
    pub timeout_secs: u64,
    pub max_image_bytes: Option<usize>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: LanguageHint::default(),
            tesseract_path: defaults::DEFAULT_TESSERACT_PATH.to_string(),
            timeout_secs: defaults::DEFAULT_OCR_TIMEOUT_SECS,
            max_image_bytes: Some(defaults::DEFAULT_MAX_IMAGE_BYTES),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RepliesConfig {
    pub locale: ReplyLocale,
    /// Characters of recognized text quoted when no digits were found.
    pub preview_chars: usize,
}

impl Default for RepliesConfig {
    fn default() -> Self {
        Self { locale: ReplyLocale::default(), preview_chars: defaults::DEFAULT_PREVIEW_CHARS }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
    /// When set, NDJSON logs are also written to a daily rolling file here.
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: defaults::DEFAULT_LOG_LEVEL.to_string(), json: false, dir: None }
    }
}

// ---------------------------------------------------------------------------
// Secrets
// ---------------------------------------------------------------------------

/// Channel credentials. `Debug` never prints them in full.
#[derive(Clone, PartialEq, Eq)]
pub struct LineCredentials {
    pub channel_access_token: String,
    pub channel_secret: String,
}

impl fmt::Debug for LineCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineCredentials")
            .field("channel_access_token", &mask_secret(&self.channel_access_token))
            .field("channel_secret", &mask_secret(&self.channel_secret))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg: MeterlineConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(cfg, MeterlineConfig::default());
        assert_eq!(cfg.server.webhook_path, "/api/line/webhook");
        assert_eq!(cfg.replies.preview_chars, 50);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let yaml = "ocr:\n  language: eng+tha\nline:\n  signaturePolicy: enforce\n";
        let cfg: MeterlineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.ocr.language, LanguageHint::EnglishThai);
        assert_eq!(cfg.ocr.tesseract_path, "tesseract");
        assert_eq!(cfg.line.signature_policy, SignaturePolicy::Enforce);
        assert_eq!(cfg.line.api_base, "https://api.line.me");
    }

    #[test]
    fn credentials_debug_is_masked() {
        let creds = LineCredentials {
            channel_access_token: "abcdefghijklmnop".into(),
            channel_secret: "0123456789abcdef".into(),
        };
        let dbg = format!("{creds:?}");
        assert!(!dbg.contains("abcdefghijklmnop"));
        assert!(!dbg.contains("0123456789abcdef"));
    }
}
