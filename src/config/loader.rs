//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid environment variable {name}: {value:?}")]
    Env { name: &'static str, value: String },
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub const ENV_API_KEY: &str = "GATEWAY_API_KEY";
pub const ENV_TRUSTED_HOPS: &str = "GATEWAY_TRUSTED_HOPS";
pub const ENV_DEBUG_ENDPOINTS: &str = "GATEWAY_DEBUG_ENDPOINTS";
pub const ENV_BIND_ADDRESS: &str = "GATEWAY_BIND_ADDRESS";
pub const ENV_VISION_ENDPOINT: &str = "GATEWAY_VISION_ENDPOINT";
pub const ENV_VISION_API_KEY: &str = "GATEWAY_VISION_API_KEY";

/// Load configuration from an optional TOML file, apply environment
/// overrides, then validate.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => GatewayConfig::default(),
    };

    let config = apply_env_overrides(config, |name| std::env::var(name).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment values on top of a parsed config.
///
/// Empty values are treated as unset so `GATEWAY_API_KEY=` does not
/// produce an empty shared secret.
pub fn apply_env_overrides<F>(mut config: GatewayConfig, lookup: F) -> Result<GatewayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(key) = get(ENV_API_KEY) {
        config.auth.api_key = Some(key);
    }
    if let Some(raw) = get(ENV_TRUSTED_HOPS) {
        config.proxy.trusted_hops = raw.trim().parse().map_err(|_| ConfigError::Env {
            name: ENV_TRUSTED_HOPS,
            value: raw.clone(),
        })?;
    }
    if let Some(raw) = get(ENV_DEBUG_ENDPOINTS) {
        config.debug.enabled = parse_flag(&raw).ok_or(ConfigError::Env {
            name: ENV_DEBUG_ENDPOINTS,
            value: raw.clone(),
        })?;
    }
    if let Some(addr) = get(ENV_BIND_ADDRESS) {
        config.listener.bind_address = addr;
    }
    if let Some(endpoint) = get(ENV_VISION_ENDPOINT) {
        config.vision.endpoint = Some(endpoint);
    }
    if let Some(key) = get(ENV_VISION_API_KEY) {
        config.vision.api_key = Some(key);
    }

    Ok(config)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
