use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::TryStreamExt;

use crate::error::ChannelError;
use crate::types::{ImageBytes, LanguageHint, ReplyPayload};

/// Chunked body of a content download.
pub type ContentStream = BoxStream<'static, Result<Bytes, ChannelError>>;

/// Outbound side of the messaging platform.
#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// Client name for logging.
    fn name(&self) -> &str;

    /// Open the binary content of a message (image, video, ...).
    async fn fetch_content(&self, message_id: &str) -> Result<ContentStream, ChannelError>;

    /// Answer an inbound event. Reply tokens are single-use.
    async fn reply(&self, reply_token: &str, payload: &ReplyPayload) -> Result<(), ChannelError>;
}

/// Drain a content stream into one owned buffer.
///
/// With a `limit`, stops pulling as soon as the buffer would exceed it.
pub async fn collect_content(
    mut stream: ContentStream,
    limit: Option<usize>,
) -> Result<ImageBytes, ChannelError> {
    let mut image = ImageBytes::default();
    while let Some(chunk) = stream.try_next().await? {
        if let Some(limit) = limit {
            if image.len() + chunk.len() > limit {
                return Err(ChannelError::ContentRetrieval(format!(
                    "content exceeds limit of {limit} bytes"
                )));
            }
        }
        image.extend(&chunk);
    }
    Ok(image)
}

/// Progress notification from a recognition engine.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrProgress {
    pub status: String,
    /// 0.0 ..= 1.0
    pub progress: f32,
}

impl OcrProgress {
    pub fn new(status: impl Into<String>, progress: f32) -> Self {
        Self { status: status.into(), progress: progress.clamp(0.0, 1.0) }
    }
}

pub type ProgressSink = Arc<dyn Fn(OcrProgress) + Send + Sync>;

/// The engine that actually reads pixels.
#[async_trait]
pub trait RecognitionEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Recognize text in `image`. Progress is observational only.
    async fn recognize(
        &self,
        image: &[u8],
        language: LanguageHint,
        progress: ProgressSink,
    ) -> Result<String>;
}
