//! Structured logging for meterline.
//!
//! Console output (plain or JSON), optional rolling NDJSON file, and
//! redaction helpers for anything that may carry tokens.

pub mod logger;
pub mod redact;

pub use logger::init_logger;
pub use redact::{mask_secret, preview_body, redact_sensitive_data};
