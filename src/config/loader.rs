//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::RelayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Upstream base URL override.
pub const ENV_BPM_BASE_URL: &str = "BPM_BASE_URL";
/// Listener bind address override.
pub const ENV_BIND_ADDRESS: &str = "RELAY_BIND_ADDRESS";
/// Log level override.
pub const ENV_LOG_LEVEL: &str = "RELAY_LOG_LEVEL";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: RelayConfig = toml::from_str(&content)?;
    finish(config, |key| std::env::var(key).ok())
}

/// Defaults plus environment overrides, validated.
pub fn load_default() -> Result<RelayConfig, ConfigError> {
    finish(RelayConfig::default(), |key| std::env::var(key).ok())
}

fn finish<F>(mut config: RelayConfig, env: F) -> Result<RelayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    apply_env_overrides(&mut config, env);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Environment values win over file values.
pub fn apply_env_overrides<F>(config: &mut RelayConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = env(ENV_BPM_BASE_URL).filter(|v| !v.is_empty()) {
        config.upstream.base_url = url;
    }
    if let Some(addr) = env(ENV_BIND_ADDRESS).filter(|v| !v.is_empty()) {
        config.listener.bind_address = addr;
    }
    if let Some(level) = env(ENV_LOG_LEVEL).filter(|v| !v.is_empty()) {
        config.observability.log_level = level;
    }
}
