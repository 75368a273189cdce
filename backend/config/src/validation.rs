//! Config validation: checks that are not expressed in the type system.

use thiserror::Error;

use crate::schema::MeterlineConfig;

/// A config validation finding with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError { path: path.into(), message: message.into() });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError { path: path.into(), message: message.into() });
    }
}

pub fn validate(config: &MeterlineConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_server(config, &mut report);
    validate_line(config, &mut report);
    validate_ocr(config, &mut report);
    report
}

fn validate_server(config: &MeterlineConfig, report: &mut ValidationReport) {
    let path = &config.server.webhook_path;
    if !path.starts_with('/') {
        report.error("server.webhookPath", format!("'{path}' must start with '/'"));
    } else if path == "/api/health" {
        report.error("server.webhookPath", "'/api/health' is reserved for the health endpoint");
    }
    if config.server.port == 0 {
        report.warn("server.port", "Port 0 binds a random port");
    }
}

fn validate_line(config: &MeterlineConfig, report: &mut ValidationReport) {
    for (field, url) in [
        ("line.apiBase", &config.line.api_base),
        ("line.dataApiBase", &config.line.data_api_base),
    ] {
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            report.error(field, format!("'{url}' is not an http(s) URL"));
        }
    }
    if config.line.call_timeout_secs == 0 {
        report.warn("line.callTimeoutSecs", "0 means every outbound call times out immediately");
    }
}

fn validate_ocr(config: &MeterlineConfig, report: &mut ValidationReport) {
    if config.ocr.tesseract_path.trim().is_empty() {
        report.error("ocr.tesseractPath", "Recognition engine path cannot be empty");
    }
    if config.ocr.timeout_secs == 0 {
        report.warn("ocr.timeoutSecs", "0 means recognition always times out");
    }
    if config.replies.preview_chars == 0 {
        report.warn("replies.previewChars", "Text previews will be empty");
    }
}
