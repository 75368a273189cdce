//! Reading parser: turns recognized text into the reply a user sees.
//!
//! Digit runs win over everything else, because the images we get are
//! almost always photos of meter displays.

use meterline_core::{OcrResult, ReplyPayload};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::replies::ReplyTemplates;

/// ASCII digits only; Thai numerals are not readings.
static DIGIT_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").unwrap());

pub const DEFAULT_PREVIEW_CHARS: usize = 50;

/// Maximal runs of ASCII digits, left to right, duplicates kept.
pub fn digit_runs(text: &str) -> Vec<&str> {
    DIGIT_RUN_RE.find_iter(text).map(|m| m.as_str()).collect()
}

/// First `n` characters of `text`, never splitting a character.
pub fn char_prefix(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}

#[derive(Debug, Clone)]
pub struct ReadingParser {
    templates: ReplyTemplates,
    preview_chars: usize,
}

impl ReadingParser {
    pub fn new(templates: ReplyTemplates, preview_chars: usize) -> Self {
        Self { templates, preview_chars }
    }

    pub fn format(&self, raw: &OcrResult) -> ReplyPayload {
        let text = raw.raw_text.as_str();
        if text.is_empty() {
            return self.templates.no_readable_content();
        }

        let runs = digit_runs(text);
        if !runs.is_empty() {
            return self.templates.digits_found(&runs);
        }

        self.templates.text_preview(char_prefix(text, self.preview_chars))
    }
}

impl Default for ReadingParser {
    fn default() -> Self {
        Self::new(ReplyTemplates::default(), DEFAULT_PREVIEW_CHARS)
    }
}
