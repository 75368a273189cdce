//! Fixed reply templates, per locale.

use meterline_core::{ReplyLocale, ReplyPayload};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyTemplates {
    locale: ReplyLocale,
}

impl ReplyTemplates {
    pub fn new(locale: ReplyLocale) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> ReplyLocale {
        self.locale
    }

    /// Echo of an inbound text message.
    pub fn text_received(&self, text: &str) -> ReplyPayload {
        ReplyPayload::new(match self.locale {
            ReplyLocale::English => format!("received: \"{text}\""),
            ReplyLocale::Thai => format!("ได้รับข้อความ: \"{text}\""),
        })
    }

    pub fn digits_found(&self, runs: &[&str]) -> ReplyPayload {
        let joined = runs.join(", ");
        ReplyPayload::new(match self.locale {
            ReplyLocale::English => format!("Reading: {joined}"),
            ReplyLocale::Thai => format!("อ่านได้ตัวเลข: {joined}"),
        })
    }

    /// `prefix` is already truncated; the ellipsis is appended here.
    pub fn text_preview(&self, prefix: &str) -> ReplyPayload {
        ReplyPayload::new(match self.locale {
            ReplyLocale::English => format!("Text in image: {prefix}..."),
            ReplyLocale::Thai => format!("ข้อความในภาพ: {prefix}..."),
        })
    }

    pub fn no_readable_content(&self) -> ReplyPayload {
        ReplyPayload::new(match self.locale {
            ReplyLocale::English => "No readable content found in the image",
            ReplyLocale::Thai => "ไม่พบตัวเลขในภาพ",
        })
    }

    pub fn processing_failed(&self) -> ReplyPayload {
        ReplyPayload::new(match self.locale {
            ReplyLocale::English => "Sorry, something went wrong while processing the image",
            ReplyLocale::Thai => "เกิดข้อผิดพลาดในการประมวลผลภาพ",
        })
    }
}

impl Default for ReplyTemplates {
    fn default() -> Self {
        Self::new(ReplyLocale::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_received_quotes_verbatim() {
        let t = ReplyTemplates::new(ReplyLocale::English);
        assert_eq!(t.text_received("hello").text, "received: \"hello\"");
        let t = ReplyTemplates::new(ReplyLocale::Thai);
        assert_eq!(t.text_received("สวัสดี").text, "ได้รับข้อความ: \"สวัสดี\"");
    }

    #[test]
    fn fixed_messages_are_non_empty() {
        for locale in [ReplyLocale::English, ReplyLocale::Thai] {
            let t = ReplyTemplates::new(locale);
            assert!(!t.no_readable_content().text.is_empty());
            assert!(!t.processing_failed().text.is_empty());
        }
    }
}
