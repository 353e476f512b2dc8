//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, request timeout).
    pub listener: ListenerConfig,

    /// API key authentication.
    pub auth: AuthConfig,

    /// Reverse proxy topology in front of the gateway.
    pub proxy: ProxyTopologyConfig,

    /// Rate limiting tiers.
    pub rate_limit: RateLimitConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Debug-only endpoints.
    pub debug: DebugConfig,

    /// Upstream vision/LLM API.
    pub vision: VisionConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// API key authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared secret. When unset the `/api` routes are open (development mode).
    pub api_key: Option<String>,

    /// Header carrying the presented key. Looked up case-insensitively.
    pub header: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            header: "x-api-key".to_string(),
        }
    }
}

/// How many reverse proxy hops sit in front of the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyTopologyConfig {
    /// Number of trusted `X-Forwarded-For` hops. 0 = use the socket address.
    pub trusted_hops: usize,
}

/// Fixed window length shared by both tiers unless overridden: 15 minutes.
pub const DEFAULT_WINDOW_SECS: u64 = 15 * 60;

/// A single fixed-window tier.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct TierConfig {
    /// Maximum requests per window. 0 disables the tier.
    pub max_requests: u64,

    /// Window length in seconds.
    pub window_secs: u64,
}

impl TierConfig {
    pub fn general() -> Self {
        Self {
            max_requests: 100,
            window_secs: DEFAULT_WINDOW_SECS,
        }
    }

    pub fn api() -> Self {
        Self {
            max_requests: 50,
            window_secs: DEFAULT_WINDOW_SECS,
        }
    }
}

/// Rate limiting configuration.
///
/// Read through `RateLimitSection` so a tier table may set only some of
/// its fields; the rest keep that tier's own defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(from = "RateLimitSection")]
pub struct RateLimitConfig {
    /// Applied to every route except the health check.
    pub general: TierConfig,

    /// Applied to `/api` routes in addition to the general tier.
    pub api: TierConfig,

    /// How often expired counters are swept, in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            general: TierConfig::general(),
            api: TierConfig::api(),
            sweep_interval_secs: 60,
        }
    }
}

/// `[rate_limit.general]` / `[rate_limit.api]` as written in the file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TierSection {
    max_requests: Option<u64>,
    window_secs: Option<u64>,
}

impl TierSection {
    fn over(self, base: TierConfig) -> TierConfig {
        TierConfig {
            max_requests: self.max_requests.unwrap_or(base.max_requests),
            window_secs: self.window_secs.unwrap_or(base.window_secs),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RateLimitSection {
    general: TierSection,
    api: TierSection,
    sweep_interval_secs: Option<u64>,
}

impl From<RateLimitSection> for RateLimitConfig {
    fn from(section: RateLimitSection) -> Self {
        let defaults = RateLimitConfig::default();
        Self {
            general: section.general.over(defaults.general),
            api: section.api.over(defaults.api),
            sweep_interval_secs: section
                .sweep_interval_secs
                .unwrap_or(defaults.sweep_interval_secs),
        }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Debug endpoint toggles.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DebugConfig {
    /// Mount `/api/debug/headers`.
    pub enabled: bool,
}

/// Vision/LLM upstream configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Full URL requests are forwarded to. `None` disables the proxy.
    pub endpoint: Option<String>,

    /// Bearer token sent upstream.
    pub api_key: Option<String>,

    /// Upstream request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_secs: 60,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_tiers() {
        let config = GatewayConfig::default();
        assert_eq!(config.rate_limit.general.max_requests, 100);
        assert_eq!(config.rate_limit.api.max_requests, 50);
        assert_eq!(config.rate_limit.api.window_secs, 900);
        assert_eq!(config.limits.max_body_bytes, 10 * 1024 * 1024);
        assert_eq!(config.auth.header, "x-api-key");
        assert!(config.auth.api_key.is_none());
        assert_eq!(config.proxy.trusted_hops, 0);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [auth]
            api_key = "s3cret"

            [rate_limit.api]
            max_requests = 5
            window_secs = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.auth.api_key.as_deref(), Some("s3cret"));
        assert_eq!(config.auth.header, "x-api-key");
        assert_eq!(config.rate_limit.api.max_requests, 5);
        assert_eq!(config.rate_limit.general.max_requests, 100);
    }

    #[test]
    fn tier_section_may_set_one_field() {
        let config: GatewayConfig =
            toml::from_str("[rate_limit.api]\nmax_requests = 5\n").unwrap();
        assert_eq!(config.rate_limit.api.max_requests, 5);
        assert_eq!(config.rate_limit.api.window_secs, DEFAULT_WINDOW_SECS);
        assert_eq!(config.rate_limit.general, TierConfig::general());

        let config: GatewayConfig =
            toml::from_str("[rate_limit.general]\nwindow_secs = 60\n").unwrap();
        assert_eq!(config.rate_limit.general.max_requests, 100);
        assert_eq!(config.rate_limit.general.window_secs, 60);
        assert_eq!(config.rate_limit.api.max_requests, 50);
        assert_eq!(config.rate_limit.sweep_interval_secs, 60);
    }
}
