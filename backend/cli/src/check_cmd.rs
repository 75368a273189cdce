//! `meterline check-config`

use std::collections::HashMap;

use anyhow::{Result, bail};
use meterline_config::{LINE_CHANNEL_SECRET, LINE_CHANNEL_TOKEN, MeterlineConfig, load_credentials, validate};
use meterline_logging::mask_secret;

/// Print the effective config and every finding. Fails on errors.
pub fn run(config: &MeterlineConfig, env: &HashMap<String, String>) -> Result<()> {
    println!("Effective configuration:");
    println!("{}", serde_json::to_string_pretty(config)?);
    println!();

    let mut ok = true;

    println!("Credentials:");
    match load_credentials(env) {
        Ok(creds) => {
            println!("  🟢 {LINE_CHANNEL_TOKEN} = {}", mask_secret(&creds.channel_access_token));
            println!("  🟢 {LINE_CHANNEL_SECRET} = {}", mask_secret(&creds.channel_secret));
        }
        Err(err) => {
            println!("  🔴 {err}");
            ok = false;
        }
    }

    let report = validate(config);
    println!("Validation:");
    for warning in &report.warnings {
        println!("  🟡 {}: {}", warning.path, warning.message);
    }
    for error in &report.errors {
        println!("  🔴 {}: {}", error.path, error.message);
    }
    if report.warnings.is_empty() && report.errors.is_empty() {
        println!("  🟢 no findings");
    }
    ok &= report.is_valid();

    println!();
    if !ok {
        bail!("configuration is not usable");
    }
    println!("✅ Configuration OK");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credentials_fail() {
        assert!(run(&MeterlineConfig::default(), &HashMap::new()).is_err());
    }

    #[test]
    fn defaults_with_credentials_pass() {
        let env = HashMap::from([
            (LINE_CHANNEL_TOKEN.to_string(), "token-value".to_string()),
            (LINE_CHANNEL_SECRET.to_string(), "secret-value".to_string()),
        ]);
        assert!(run(&MeterlineConfig::default(), &env).is_ok());
    }
}
