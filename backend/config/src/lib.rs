//! `meterline-config`: runtime configuration.
//!
//! Provides:
//! - Typed config schema with defaults for every field
//! - YAML loading with `${ENV_VAR}` substitution
//! - Environment overrides
//! - Credential loading (environment only)
//! - Validation

pub mod defaults;
pub mod env;
pub mod io;
pub mod schema;
pub mod validation;

pub use env::{
    apply_env_overrides, load_credentials, process_env, resolve_env_vars_with, LINE_CHANNEL_SECRET,
    LINE_CHANNEL_TOKEN,
};
pub use io::{load_config, parse_config, CONFIG_FILE_NAME};
pub use schema::{
    LineConfig, LineCredentials, LoggingConfig, MeterlineConfig, OcrConfig, RepliesConfig,
    ServerConfig,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Result};

/// Load the file, apply environment overrides, and validate.
///
/// This is the main entry point for loading a config at startup.
pub async fn load_and_prepare(path: &Path, env: &HashMap<String, String>) -> Result<MeterlineConfig> {
    let config = load_with_overrides(path, env).await?;
    ensure_valid(&config)?;
    Ok(config)
}

/// Load the file and apply environment overrides, without validating.
pub async fn load_with_overrides(path: &Path, env: &HashMap<String, String>) -> Result<MeterlineConfig> {
    let config = load_config(path, env).await?;
    Ok(apply_env_overrides(config, env)?)
}

/// Log every validation finding; fail if any of them is an error.
pub fn ensure_valid(config: &MeterlineConfig) -> Result<ValidationReport> {
    let report = validate(config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if !report.is_valid() {
        bail!("{} config error(s); first: {}", report.errors.len(), report.errors[0]);
    }
    Ok(report)
}
