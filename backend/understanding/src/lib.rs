pub mod ocr;
pub mod reading;
pub mod replies;

pub use ocr::{OcrExtractor, TesseractEngine};
pub use reading::{char_prefix, digit_runs, ReadingParser, DEFAULT_PREVIEW_CHARS};
pub use replies::ReplyTemplates;
