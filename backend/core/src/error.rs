use thiserror::Error;

/// Deployment problems detected before any event is dispatched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(String),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}

/// Failures of the OCR Extractor.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OcrError {
    /// The image buffer violates the extractor's input contract.
    #[error("invalid OCR input: {0}")]
    InvalidInput(String),

    #[error("recognition failed: {0}")]
    RecognitionFailed(String),
}

/// Failures talking to the messaging platform.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChannelError {
    #[error("content retrieval failed: {0}")]
    ContentRetrieval(String),

    #[error("reply delivery failed: {0}")]
    ReplyDelivery(String),
}

/// Anything that can go wrong while handling one event.
///
/// These never cross the event router; they end up as `EventOutcome::Failed`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EventError {
    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Ocr(#[from] OcrError),
}

/// Request-level failures that reach the HTTP layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WebhookError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("authenticity check failed: {0}")]
    Authenticity(String),
}
