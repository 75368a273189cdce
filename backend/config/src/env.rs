//! Environment handling: `${VAR}` substitution in config files, environment
//! overrides, and credential loading.
//!
//! Only uppercase `[A-Z_][A-Z0-9_]*` variable names are matched.
//! `$${VAR}` escapes to a literal `${VAR}`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use meterline_core::ConfigError;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

use crate::schema::{LineCredentials, MeterlineConfig};

pub const LINE_CHANNEL_TOKEN: &str = "LINE_CHANNEL_TOKEN";
pub const LINE_CHANNEL_SECRET: &str = "LINE_CHANNEL_SECRET";

/// Matches `${VAR}` and its escaped form `$${VAR}`.
static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$?\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

/// Snapshot of the process environment.
pub fn process_env() -> HashMap<String, String> {
    std::env::vars().collect()
}

/// Substitute `${VAR}` references in every string leaf of `value`.
///
/// A referenced variable that is unset or empty is an error naming the
/// config path it was referenced from.
pub fn resolve_env_vars_with(
    value: &Value,
    env: &HashMap<String, String>,
) -> Result<Value, ConfigError> {
    substitute_value(value, env, "")
}

fn substitute_value(
    value: &Value,
    env: &HashMap<String, String>,
    path: &str,
) -> Result<Value, ConfigError> {
    match value {
        Value::String(s) => substitute_string(s, env, path).map(Value::String),
        Value::Array(arr) => arr
            .iter()
            .enumerate()
            .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                let child_path = if path.is_empty() { k.clone() } else { format!("{path}.{k}") };
                result.insert(k.clone(), substitute_value(v, env, &child_path)?);
            }
            Ok(Value::Object(result))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(
    s: &str,
    env: &HashMap<String, String>,
    path: &str,
) -> Result<String, ConfigError> {
    if !s.contains('$') {
        return Ok(s.to_string());
    }

    let mut missing: Option<String> = None;
    let substituted = ENV_VAR_PATTERN.replace_all(s, |caps: &Captures| {
        let var_name = &caps[1];
        if caps[0].starts_with("$$") {
            return format!("${{{var_name}}}");
        }
        match env.get(var_name) {
            Some(val) if !val.is_empty() => val.clone(),
            _ => {
                missing.get_or_insert_with(|| var_name.to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(var_name) => Err(ConfigError::Invalid {
            key: path.to_string(),
            message: format!("references unset environment variable {var_name}"),
        }),
        None => Ok(substituted.into_owned()),
    }
}

/// Apply `METERLINE_*` / `LINE_*` environment overrides on top of a loaded config.
pub fn apply_env_overrides(
    mut config: MeterlineConfig,
    env: &HashMap<String, String>,
) -> Result<MeterlineConfig, ConfigError> {
    if let Some(v) = lookup(env, "METERLINE_BIND") {
        config.server.bind_address = v.to_string();
    }
    if let Some(v) = parse_var(env, "METERLINE_PORT")? {
        config.server.port = v;
    }
    if let Some(v) = lookup(env, "METERLINE_WEBHOOK_PATH") {
        config.server.webhook_path = v.to_string();
    }
    if let Some(v) = lookup(env, "LINE_API_BASE") {
        config.line.api_base = v.to_string();
    }
    if let Some(v) = lookup(env, "LINE_DATA_API_BASE") {
        config.line.data_api_base = v.to_string();
    }
    if let Some(v) = parse_var(env, "LINE_SIGNATURE_POLICY")? {
        config.line.signature_policy = v;
    }
    if let Some(v) = parse_var(env, "METERLINE_CALL_TIMEOUT_SECS")? {
        config.line.call_timeout_secs = v;
    }
    if let Some(v) = parse_var(env, "METERLINE_OCR_LANGUAGE")? {
        config.ocr.language = v;
    }
    if let Some(v) = lookup(env, "TESSERACT_PATH") {
        config.ocr.tesseract_path = v.to_string();
    }
    if let Some(v) = parse_var(env, "METERLINE_OCR_TIMEOUT_SECS")? {
        config.ocr.timeout_secs = v;
    }
    if let Some(v) = parse_var(env, "METERLINE_REPLY_LOCALE")? {
        config.replies.locale = v;
    }
    if let Some(v) = lookup(env, "RUST_LOG") {
        config.logging.level = v.to_string();
    }
    if let Some(v) = parse_var(env, "METERLINE_LOG_JSON")? {
        config.logging.json = v;
    }
    if let Some(v) = lookup(env, "METERLINE_LOG_DIR") {
        config.logging.dir = Some(PathBuf::from(v));
    }
    Ok(config)
}

/// Read the two required channel secrets.
pub fn load_credentials(env: &HashMap<String, String>) -> Result<LineCredentials, ConfigError> {
    let channel_access_token = lookup(env, LINE_CHANNEL_TOKEN)
        .ok_or_else(|| ConfigError::MissingVar(LINE_CHANNEL_TOKEN.to_string()))?;
    let channel_secret = lookup(env, LINE_CHANNEL_SECRET)
        .ok_or_else(|| ConfigError::MissingVar(LINE_CHANNEL_SECRET.to_string()))?;
    Ok(LineCredentials {
        channel_access_token: channel_access_token.to_string(),
        channel_secret: channel_secret.to_string(),
    })
}

/// Non-empty, trimmed value of `key`.
fn lookup<'a>(env: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    env.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn parse_var<T>(env: &HashMap<String, String>, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(env, key)
        .map(|raw| {
            raw.parse::<T>().map_err(|e| ConfigError::Invalid {
                key: key.to_string(),
                message: e.to_string(),
            })
        })
        .transpose()
}
