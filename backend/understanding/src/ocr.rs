//! Optical Character Recognition (OCR)
//!
//! [`OcrExtractor`] owns the input/output contract around a
//! [`RecognitionEngine`]: non-empty input, trimmed output, and a clean split
//! between bad input and engine failure. [`TesseractEngine`] drives the
//! `tesseract` command-line tool, streaming the image over stdin.

use std::process::Stdio;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use meterline_core::{
    ImageBytes, LanguageHint, OcrError, OcrProgress, OcrResult, ProgressSink, RecognitionEngine,
};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

pub struct OcrExtractor {
    engine: Arc<dyn RecognitionEngine>,
    max_image_bytes: Option<usize>,
}

impl OcrExtractor {
    pub fn new(engine: Arc<dyn RecognitionEngine>) -> Self {
        Self { engine, max_image_bytes: None }
    }

    pub fn with_max_image_bytes(mut self, limit: Option<usize>) -> Self {
        self.max_image_bytes = limit;
        self
    }

    pub fn max_image_bytes(&self) -> Option<usize> {
        self.max_image_bytes
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Recognize text, logging engine progress at debug level.
    pub async fn extract(&self, image: &ImageBytes, language: LanguageHint) -> Result<OcrResult, OcrError> {
        let sink: ProgressSink = Arc::new(|p: OcrProgress| {
            debug!(status = %p.status, progress = p.progress, "OCR progress");
        });
        self.extract_with_progress(image, language, sink).await
    }

    pub async fn extract_with_progress(
        &self,
        image: &ImageBytes,
        language: LanguageHint,
        progress: ProgressSink,
    ) -> Result<OcrResult, OcrError> {
        if image.is_empty() {
            return Err(OcrError::InvalidInput("image buffer is empty".into()));
        }
        if let Some(limit) = self.max_image_bytes {
            if image.len() > limit {
                return Err(OcrError::InvalidInput(format!(
                    "image is {} bytes, limit is {limit}",
                    image.len()
                )));
            }
        }

        let text = self
            .engine
            .recognize(image.as_slice(), language, progress)
            .await
            .map_err(|e| OcrError::RecognitionFailed(format!("{e:#}")))?;

        let result = OcrResult::new(&text);
        info!(engine = self.engine.name(), chars = result.raw_text.chars().count(), "OCR complete");
        Ok(result)
    }
}

/// Runs `tesseract stdin stdout -l <langs>`.
pub struct TesseractEngine {
    binary: String,
}

impl TesseractEngine {
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

#[async_trait]
impl RecognitionEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize(&self, image: &[u8], language: LanguageHint, progress: ProgressSink) -> Result<String> {
        progress(OcrProgress::new("loading tesseract", 0.0));

        let mut child = Command::new(&self.binary)
            .args(["stdin", "stdout", "-l", language.tesseract_langs()])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn {}", self.binary))?;

        let mut stdin = child.stdin.take().context("tesseract stdin unavailable")?;
        let data = image.to_vec();
        // Feed stdin concurrently so a full stdout pipe can't deadlock us.
        let writer = tokio::spawn(async move {
            stdin.write_all(&data).await?;
            stdin.shutdown().await
        });

        progress(OcrProgress::new("recognizing text", 0.5));
        let output = child.wait_with_output().await.context("Failed to wait for tesseract")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("tesseract exited with {}: {}", output.status, stderr.trim());
        }
        writer
            .await
            .context("stdin writer task failed")?
            .context("Failed to write image to tesseract")?;

        progress(OcrProgress::new("recognizing text", 1.0));
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
