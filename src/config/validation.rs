//! Configuration validation.
//!
//! Semantic checks only; serde handles syntax. All errors are collected
//! so an operator can fix a config file in one pass.

use std::net::SocketAddr;

use crate::config::schema::{GatewayConfig, TierConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validate a configuration, returning every error found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            "must be a socket address like 0.0.0.0:3000",
        ));
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "listener.request_timeout_secs",
            "must be greater than 0",
        ));
    }

    if let Some(key) = &config.auth.api_key {
        if key.is_empty() {
            errors.push(ValidationError::new(
                "auth.api_key",
                "must not be empty; omit it to run without authentication",
            ));
        }
    }
    if axum::http::HeaderName::from_bytes(config.auth.header.as_bytes()).is_err() {
        errors.push(ValidationError::new("auth.header", "not a valid header name"));
    }

    check_tier("rate_limit.general", &config.rate_limit.general, &mut errors);
    check_tier("rate_limit.api", &config.rate_limit.api, &mut errors);
    if config.rate_limit.sweep_interval_secs == 0 {
        errors.push(ValidationError::new(
            "rate_limit.sweep_interval_secs",
            "must be greater than 0",
        ));
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::new(
            "limits.max_body_bytes",
            "must be greater than 0",
        ));
    }

    if let Some(endpoint) = &config.vision.endpoint {
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            errors.push(ValidationError::new(
                "vision.endpoint",
                "must be an http(s) URL",
            ));
        }
    }
    if config.vision.timeout_secs == 0 {
        errors.push(ValidationError::new(
            "vision.timeout_secs",
            "must be greater than 0",
        ));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "must be a socket address",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_tier(field: &str, tier: &TierConfig, errors: &mut Vec<ValidationError>) {
    // max_requests = 0 is allowed and disables the tier
    if tier.window_secs == 0 {
        errors.push(ValidationError::new(
            format!("{field}.window_secs"),
            "must be greater than 0",
        ));
    }
}
