//! Default values for every configuration field.

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_WEBHOOK_PATH: &str = "/api/line/webhook";

pub const LINE_API_BASE: &str = "https://api.line.me";
pub const LINE_DATA_API_BASE: &str = "https://api-data.line.me";

/// Per outbound call (content download, reply).
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 10;

/// Recognition is CPU bound and much slower than a network round trip.
pub const DEFAULT_OCR_TIMEOUT_SECS: u64 = 30;

/// LINE caps image messages at 10 MB.
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

pub const DEFAULT_TESSERACT_PATH: &str = "tesseract";
pub const DEFAULT_PREVIEW_CHARS: usize = 50;
pub const DEFAULT_LOG_LEVEL: &str = "info";
