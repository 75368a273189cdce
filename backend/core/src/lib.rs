pub mod error;
pub mod event;
pub mod traits;
pub mod types;

pub use error::{ChannelError, ConfigError, EventError, OcrError, WebhookError};
pub use event::{
    Event, EventKind, EventMeta, EventOutcome, MessageContent, OutcomeSummary, SkipReason,
    WebhookBatch,
};
pub use traits::{
    collect_content, ContentStream, MessagingClient, OcrProgress, ProgressSink, RecognitionEngine,
};
pub use types::{
    ImageBytes, LanguageHint, OcrResult, ReplyLocale, ReplyPayload, SignaturePolicy,
    MAX_REPLY_CHARS,
};
