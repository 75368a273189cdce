//! Event router.
//!
//! Every event of a batch runs in its own task; the batch is joined before
//! the webhook is acknowledged. Whatever happens inside one event (an error,
//! a timeout, a panic) is folded into that event's [`EventOutcome`] and never
//! reaches its siblings or the HTTP layer.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use meterline_core::{
    ChannelError, Event, EventError, EventKind, EventOutcome, ImageBytes, LanguageHint,
    MessageContent, MessagingClient, OcrError, ReplyPayload, SkipReason, WebhookBatch,
    collect_content,
};
use meterline_understanding::{OcrExtractor, ReadingParser, ReplyTemplates};
use tokio::time::timeout;
use tracing::{Instrument, debug, error, info, info_span, warn};

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_OCR_TIMEOUT: Duration = Duration::from_secs(30);

pub struct EventRouter {
    client: Arc<dyn MessagingClient>,
    extractor: OcrExtractor,
    parser: ReadingParser,
    templates: ReplyTemplates,
    language: LanguageHint,
    call_timeout: Duration,
    ocr_timeout: Duration,
}

impl EventRouter {
    pub fn new(
        client: Arc<dyn MessagingClient>,
        extractor: OcrExtractor,
        parser: ReadingParser,
        templates: ReplyTemplates,
    ) -> Self {
        Self {
            client,
            extractor,
            parser,
            templates,
            language: LanguageHint::default(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            ocr_timeout: DEFAULT_OCR_TIMEOUT,
        }
    }

    pub fn with_language(mut self, language: LanguageHint) -> Self {
        self.language = language;
        self
    }

    /// `call` bounds each content download and reply; `ocr` bounds recognition.
    pub fn with_timeouts(mut self, call: Duration, ocr: Duration) -> Self {
        self.call_timeout = call;
        self.ocr_timeout = ocr;
        self
    }

    /// Handle every event concurrently. Outcomes come back in batch order.
    pub async fn process(self: Arc<Self>, batch: WebhookBatch) -> Vec<EventOutcome> {
        let handles: Vec<_> = batch
            .events
            .into_iter()
            .enumerate()
            .map(|(index, event)| {
                let span = info_span!(
                    "event",
                    index,
                    event_type = %event.kind,
                    message_type = event.message_type(),
                    webhook_event_id = event.meta.webhook_event_id.as_deref().unwrap_or("-"),
                    redelivery = event.meta.redelivery,
                );
                let router = Arc::clone(&self);
                tokio::spawn(async move { router.handle_event(event).await }.instrument(span))
            })
            .collect();

        join_all(handles)
            .await
            .into_iter()
            .enumerate()
            .map(|(index, joined)| match joined {
                Ok(outcome) => outcome,
                Err(err) if err.is_panic() => {
                    error!(index, "Event handler panicked");
                    EventOutcome::Failed("handler panicked".into())
                }
                Err(err) => {
                    error!(index, error = %err, "Event handler cancelled");
                    EventOutcome::Failed("handler cancelled".into())
                }
            })
            .collect()
    }

    async fn handle_event(&self, event: Event) -> EventOutcome {
        let outcome = match (&event.kind, event.message) {
            (EventKind::Other(kind), _) => EventOutcome::Skipped(SkipReason::UnsupportedEvent(kind.clone())),
            (EventKind::Message, None) => {
                EventOutcome::Skipped(SkipReason::UnsupportedMessage("none".into()))
            }
            (EventKind::Message, Some(MessageContent::Text { text })) => {
                self.handle_text(event.reply_token.as_deref(), &text).await
            }
            (EventKind::Message, Some(MessageContent::Image { id })) => {
                self.handle_image(event.reply_token.as_deref(), &id).await
            }
            (EventKind::Message, Some(MessageContent::Other { kind })) => {
                EventOutcome::Skipped(SkipReason::UnsupportedMessage(kind))
            }
        };

        match &outcome {
            EventOutcome::Replied => info!("Reply sent"),
            EventOutcome::Skipped(reason) => debug!(%reason, "Event skipped"),
            EventOutcome::Failed(reason) => warn!(%reason, "Event failed"),
        }
        outcome
    }

    async fn handle_text(&self, reply_token: Option<&str>, text: &str) -> EventOutcome {
        debug!(chars = text.chars().count(), "Text message");
        let Some(token) = reply_token else {
            return EventOutcome::Skipped(SkipReason::NoReplyToken);
        };
        match self.send_reply(token, &self.templates.text_received(text)).await {
            Ok(()) => EventOutcome::Replied,
            Err(err) => {
                error!(error = %err, "Reply error");
                EventOutcome::Failed(err.to_string())
            }
        }
    }

    async fn handle_image(&self, reply_token: Option<&str>, message_id: &str) -> EventOutcome {
        let Some(token) = reply_token else {
            return EventOutcome::Skipped(SkipReason::NoReplyToken);
        };
        match self.read_image(token, message_id).await {
            Ok(()) => EventOutcome::Replied,
            Err(err) => {
                error!(error = %err, message_id, "Image processing error");
                if let Err(fallback_err) = self.send_reply(token, &self.templates.processing_failed()).await {
                    error!(error = %fallback_err, "Fallback reply failed");
                }
                EventOutcome::Failed(err.to_string())
            }
        }
    }

    /// Download, recognize, parse, reply.
    async fn read_image(&self, reply_token: &str, message_id: &str) -> Result<(), EventError> {
        let image = self.download(message_id).await?;
        debug!(bytes = image.len(), "Image downloaded");

        let ocr = bounded(
            self.ocr_timeout,
            self.extractor.extract(&image, self.language),
            OcrError::RecognitionFailed,
        )
        .await?;
        drop(image);
        debug!(text = %ocr.raw_text, "OCR result");

        let reply = self.parser.format(&ocr);
        self.send_reply(reply_token, &reply).await?;
        Ok(())
    }

    async fn download(&self, message_id: &str) -> Result<ImageBytes, ChannelError> {
        let fetch = async {
            let stream = self.client.fetch_content(message_id).await?;
            collect_content(stream, self.extractor.max_image_bytes()).await
        };
        bounded(self.call_timeout, fetch, ChannelError::ContentRetrieval).await
    }

    async fn send_reply(&self, reply_token: &str, payload: &ReplyPayload) -> Result<(), ChannelError> {
        bounded(
            self.call_timeout,
            self.client.reply(reply_token, payload),
            ChannelError::ReplyDelivery,
        )
        .await
    }
}

/// Run `fut` for at most `limit`; an elapsed limit becomes `on_elapsed(..)`.
async fn bounded<T, E>(
    limit: Duration,
    fut: impl Future<Output = Result<T, E>>,
    on_elapsed: impl FnOnce(String) -> E,
) -> Result<T, E> {
    match timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(on_elapsed(format!("timed out after {limit:?}"))),
    }
}
