use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;

/// LINE rejects text messages longer than this many characters.
pub const MAX_REPLY_CHARS: usize = 5000;

/// Which character sets the recognition engine should consider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LanguageHint {
    #[default]
    #[serde(rename = "eng")]
    English,
    #[serde(rename = "eng+tha")]
    EnglishThai,
}

impl LanguageHint {
    /// Language list in the `-l` format Tesseract expects.
    pub fn tesseract_langs(&self) -> &'static str {
        match self {
            LanguageHint::English => "eng",
            LanguageHint::EnglishThai => "eng+tha",
        }
    }
}

impl fmt::Display for LanguageHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tesseract_langs())
    }
}

impl FromStr for LanguageHint {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eng" | "en" | "english" => Ok(LanguageHint::English),
            "eng+tha" | "en+th" | "english+thai" => Ok(LanguageHint::EnglishThai),
            other => Err(ConfigError::Invalid {
                key: "ocr.language".into(),
                message: format!("unknown language hint '{other}' (expected 'eng' or 'eng+tha')"),
            }),
        }
    }
}

/// Language of the fixed reply templates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyLocale {
    #[default]
    #[serde(alias = "en")]
    English,
    #[serde(alias = "th")]
    Thai,
}

impl FromStr for ReplyLocale {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(ReplyLocale::English),
            "th" | "thai" => Ok(ReplyLocale::Thai),
            other => Err(ConfigError::Invalid {
                key: "replies.locale".into(),
                message: format!("unknown reply locale '{other}'"),
            }),
        }
    }
}

/// What to do with the `x-line-signature` header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignaturePolicy {
    /// Log presence of the header and proceed.
    #[default]
    Disabled,
    /// Verify, log a warning on mismatch, proceed anyway.
    Advisory,
    /// Reject missing or invalid signatures.
    Enforce,
}

impl FromStr for SignaturePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disabled" | "off" | "none" => Ok(SignaturePolicy::Disabled),
            "advisory" | "warn" => Ok(SignaturePolicy::Advisory),
            "enforce" | "reject" => Ok(SignaturePolicy::Enforce),
            other => Err(ConfigError::Invalid {
                key: "line.signaturePolicy".into(),
                message: format!("unknown signature policy '{other}'"),
            }),
        }
    }
}

/// Downloaded image content, owned by exactly one event handler.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ImageBytes(Vec<u8>);

impl ImageBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn extend(&mut self, chunk: &[u8]) {
        self.0.extend_from_slice(chunk);
    }
}

impl fmt::Debug for ImageBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageBytes({} bytes)", self.0.len())
    }
}

impl From<Vec<u8>> for ImageBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Trimmed text recognized in an image. May be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OcrResult {
    pub raw_text: String,
}

impl OcrResult {
    pub fn new(raw: &str) -> Self {
        Self { raw_text: raw.trim().to_string() }
    }
}

/// Text message sent back to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyPayload {
    pub text: String,
}

impl ReplyPayload {
    /// Builds a payload, clamping to `MAX_REPLY_CHARS`.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let text = match text.char_indices().nth(MAX_REPLY_CHARS) {
            Some((cut, _)) => {
                warn!(
                    chars = text.chars().count(),
                    limit = MAX_REPLY_CHARS,
                    "Reply text truncated"
                );
                text[..cut].to_string()
            }
            None => text,
        };
        Self { text }
    }
}
