//! `meterline ocr <image>`: run one image through recognition and parsing
//! locally, without LINE.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use meterline_config::MeterlineConfig;
use meterline_core::{ImageBytes, LanguageHint, OcrProgress, ProgressSink};
use meterline_understanding::{OcrExtractor, ReadingParser, ReplyTemplates, TesseractEngine, digit_runs};

pub async fn run(config: &MeterlineConfig, image: &Path, language: Option<LanguageHint>) -> Result<()> {
    let bytes = tokio::fs::read(image)
        .await
        .with_context(|| format!("Failed to read image: {}", image.display()))?;

    let engine = TesseractEngine::new(config.ocr.tesseract_path.clone());
    let extractor = OcrExtractor::new(Arc::new(engine)).with_max_image_bytes(config.ocr.max_image_bytes);
    let language = language.unwrap_or(config.ocr.language);

    let sink: ProgressSink = Arc::new(|p: OcrProgress| {
        eprintln!("  [{:>3.0}%] {}", p.progress * 100.0, p.status);
    });
    let image = ImageBytes::new(bytes);
    let recognize = extractor.extract_with_progress(&image, language, sink);
    let result = tokio::time::timeout(Duration::from_secs(config.ocr.timeout_secs), recognize)
        .await
        .context("OCR timed out")??;

    let templates = ReplyTemplates::new(config.replies.locale);
    let reply = ReadingParser::new(templates, config.replies.preview_chars).format(&result);

    println!("Recognized text:\n{}\n", result.raw_text);
    println!("Digit runs: {:?}", digit_runs(&result.raw_text));
    println!("Reply: {}", reply.text);
    Ok(())
}
