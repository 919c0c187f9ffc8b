//! Configuration file and API key resolution

use anyhow::Result;
use smsrelay_core::models::Configuration;
use std::path::{Path, PathBuf};

/// Environment variable consulted when no `--api-key` is given
pub const API_KEY_ENV: &str = "SMSRELAY_API_KEY";

pub fn resolve_config_path(config_arg: Option<&str>) -> Result<PathBuf> {
    match config_arg {
        None => Configuration::default_config_path()
            .map_err(|e| anyhow::anyhow!("Config path: {}", e)),
        Some(path) if path.starts_with("~/") => {
            let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME not set"))?;
            Ok(PathBuf::from(path.replacen("~/", &format!("{}/", home), 1)))
        }
        Some(path) => Ok(PathBuf::from(path)),
    }
}

pub fn load_config(path: &Path) -> Result<Configuration> {
    let config = Configuration::load_from_file(path)
        .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", path.display(), e))?;
    if let Err(errors) = config.validate() {
        return Err(anyhow::anyhow!(
            "Invalid configuration in {}:\n  {}",
            path.display(),
            errors.join("\n  ")
        ));
    }
    Ok(config)
}

/// Pick the API key: command line, then environment, then config file.
/// An empty result is left for the controller to reject.
pub fn resolve_api_key(
    flag: Option<String>,
    env_value: Option<String>,
    config: &Configuration,
) -> String {
    [flag, env_value, config.api_key.clone()]
        .into_iter()
        .flatten()
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
        .unwrap_or_default()
}

/// Hide all but the last four characters of a key
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}
