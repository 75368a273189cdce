//! Config file loading.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::fs;
use tracing::{debug, info};

use crate::env::resolve_env_vars_with;
use crate::schema::MeterlineConfig;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "meterline.yaml";

/// Load and parse the config from disk.
///
/// Returns `Ok(Default::default())` if the file doesn't exist.
pub async fn load_config(path: &Path, env: &HashMap<String, String>) -> Result<MeterlineConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(MeterlineConfig::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = parse_config(&raw, env)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Parse YAML text, substituting `${VAR}` references before typing it.
pub fn parse_config(raw: &str, env: &HashMap<String, String>) -> Result<MeterlineConfig> {
    if raw.trim().is_empty() {
        return Ok(MeterlineConfig::default());
    }
    let value: Value = serde_yaml::from_str(raw).context("Invalid YAML")?;
    let value = resolve_env_vars_with(&value, env)?;
    let config = serde_json::from_value(value).context("Config does not match schema")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use meterline_core::LanguageHint;

    #[test]
    fn parses_yaml_with_env_reference() {
        let env: HashMap<String, String> =
            [("OCR_LANG".to_string(), "eng+tha".to_string())].into_iter().collect();
        let cfg = parse_config("ocr:\n  language: ${OCR_LANG}\nserver:\n  port: 3000\n", &env)
            .unwrap();
        assert_eq!(cfg.ocr.language, LanguageHint::EnglishThai);
        assert_eq!(cfg.server.port, 3000);
    }

    #[test]
    fn blank_file_is_default() {
        let cfg = parse_config("\n  \n", &HashMap::new()).unwrap();
        assert_eq!(cfg, MeterlineConfig::default());
    }

    #[test]
    fn schema_mismatch_is_error() {
        let err = parse_config("server:\n  port: not-a-port\n", &HashMap::new()).unwrap_err();
        assert!(format!("{err:#}").contains("schema"));
    }

    #[tokio::test]
    async fn missing_file_uses_defaults() {
        let cfg = load_config(Path::new("/nonexistent/meterline.yaml"), &HashMap::new())
            .await
            .unwrap();
        assert_eq!(cfg, MeterlineConfig::default());
    }
}
