//! In-memory doubles for the LINE client and the OCR engine.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, bail};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use meterline_core::{
    ChannelError, ContentStream, LanguageHint, MessagingClient, OcrProgress, ProgressSink,
    RecognitionEngine, ReplyPayload,
};
use meterline_understanding::{OcrExtractor, ReadingParser, ReplyTemplates};

use crate::dispatch::EventRouter;

/// Serves content by message id and records every call.
#[derive(Default)]
pub struct FakeClient {
    contents: HashMap<String, Vec<u8>>,
    failing_tokens: HashSet<String>,
    content_delay: Option<Duration>,
    replies: Mutex<Vec<(String, String)>>,
    reply_attempts: Mutex<usize>,
    fetches: Mutex<Vec<String>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content(mut self, message_id: &str, bytes: &[u8]) -> Self {
        self.contents.insert(message_id.to_string(), bytes.to_vec());
        self
    }

    pub fn failing_replies_for(mut self, reply_token: &str) -> Self {
        self.failing_tokens.insert(reply_token.to_string());
        self
    }

    pub fn with_content_delay(mut self, delay: Duration) -> Self {
        self.content_delay = Some(delay);
        self
    }

    /// Successful replies as `(reply_token, text)`.
    pub fn replies(&self) -> Vec<(String, String)> {
        self.replies.lock().unwrap().clone()
    }

    pub fn reply_attempts(&self) -> usize {
        *self.reply_attempts.lock().unwrap()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().unwrap().len()
    }
}

#[async_trait]
impl MessagingClient for FakeClient {
    fn name(&self) -> &str {
        "fake"
    }

    async fn fetch_content(&self, message_id: &str) -> Result<ContentStream, ChannelError> {
        self.fetches.lock().unwrap().push(message_id.to_string());
        if let Some(delay) = self.content_delay {
            tokio::time::sleep(delay).await;
        }
        let Some(bytes) = self.contents.get(message_id) else {
            return Err(ChannelError::ContentRetrieval("404 Not Found".into()));
        };
        // Two chunks, so callers have to concatenate.
        let (head, tail) = bytes.split_at(bytes.len() / 2);
        let chunks = vec![Ok(Bytes::copy_from_slice(head)), Ok(Bytes::copy_from_slice(tail))];
        Ok(Box::pin(stream::iter(chunks)))
    }

    async fn reply(&self, reply_token: &str, payload: &ReplyPayload) -> Result<(), ChannelError> {
        *self.reply_attempts.lock().unwrap() += 1;
        if self.failing_tokens.contains(reply_token) {
            return Err(ChannelError::ReplyDelivery("400 Bad Request: Invalid reply token".into()));
        }
        self.replies
            .lock()
            .unwrap()
            .push((reply_token.to_string(), payload.text.clone()));
        Ok(())
    }
}

/// Reads the image bytes back as UTF-8. `FAIL` errors, `PANIC` panics,
/// `SLOW` takes five seconds.
pub struct EchoEngine;

#[async_trait]
impl RecognitionEngine for EchoEngine {
    fn name(&self) -> &str {
        "echo"
    }

    async fn recognize(&self, image: &[u8], _language: LanguageHint, progress: ProgressSink) -> Result<String> {
        progress(OcrProgress::new("recognizing text", 1.0));
        let text = String::from_utf8_lossy(image).into_owned();
        match text.as_str() {
            "FAIL" => bail!("engine crashed"),
            "PANIC" => panic!("engine panicked"),
            "SLOW" => {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(text)
            }
            _ => Ok(text),
        }
    }
}

pub fn event_router(client: Arc<FakeClient>) -> EventRouter {
    let templates = ReplyTemplates::default();
    EventRouter::new(
        client,
        OcrExtractor::new(Arc::new(EchoEngine)),
        ReadingParser::new(templates, 50),
        templates,
    )
}

pub fn router_with(client: Arc<FakeClient>) -> Arc<EventRouter> {
    Arc::new(event_router(client))
}
