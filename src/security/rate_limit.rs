//! Fixed-window rate limiting keyed by client IP.
//!
//! Two independent tiers share this implementation: a general tier for all
//! routes except the health check, and a stricter API tier for `/api`.
//! A request under `/api` spends quota in both.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use tokio::time::Instant;

use crate::config::TierConfig;
use crate::details;
use crate::error::GatewayError;
use crate::http::health::HEALTH_PATH;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::client_ip::ClientIp;
use crate::security::events::{RequestMeta, SecurityEventKind};

pub const RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
pub const RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
pub const RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");
pub const RETRY_AFTER: HeaderName = HeaderName::from_static("retry-after");

/// Which counter set a limiter belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    General,
    Api,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::General => "general",
            Tier::Api => "api",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u64,
    started: Instant,
}

/// Outcome of a single [`RateLimiter::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u64,
    pub remaining: u64,
    pub reset_after: Duration,
}

impl RateLimitDecision {
    /// Write the standard `RateLimit-*` headers. Existing values are kept
    /// unless `overwrite` is set, so the innermost tier wins.
    pub fn apply_headers(&self, headers: &mut HeaderMap, overwrite: bool) {
        let reset_secs = self.reset_after.as_secs() + u64::from(self.reset_after.subsec_nanos() > 0);
        let values = [
            (RATELIMIT_LIMIT, self.limit),
            (RATELIMIT_REMAINING, self.remaining),
            (RATELIMIT_RESET, reset_secs),
        ];
        for (name, value) in values {
            if overwrite || !headers.contains_key(&name) {
                headers.insert(name, HeaderValue::from(value));
            }
        }
        if !self.allowed {
            headers.insert(RETRY_AFTER, HeaderValue::from(reset_secs));
        }
    }
}

struct RateLimiterInner {
    tier: Tier,
    max_requests: u64,
    window: Duration,
    counters: DashMap<String, Window>,
}

/// In-memory per-key rate limiter with fixed-window counters.
///
/// Cheap to clone; clones share counters.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<RateLimiterInner>,
}

impl RateLimiter {
    /// Creates a new rate limiter. `max_requests = 0` means disabled.
    pub fn new(tier: Tier, max_requests: u64, window: Duration) -> Self {
        Self {
            inner: Arc::new(RateLimiterInner {
                tier,
                max_requests,
                window,
                counters: DashMap::new(),
            }),
        }
    }

    pub fn from_config(tier: Tier, config: &TierConfig) -> Self {
        Self::new(tier, config.max_requests, Duration::from_secs(config.window_secs))
    }

    pub fn tier(&self) -> Tier {
        self.inner.tier
    }

    pub fn limit(&self) -> u64 {
        self.inner.max_requests
    }

    pub fn window(&self) -> Duration {
        self.inner.window
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.max_requests > 0
    }

    /// Count a request for `key` and decide whether it is admitted.
    ///
    /// The increment and the comparison happen while the map shard for
    /// `key` is locked, so concurrent callers cannot both take the last slot.
    pub fn check(&self, key: &str) -> RateLimitDecision {
        let limit = self.inner.max_requests;
        let window = self.inner.window;
        let now = Instant::now();

        let mut entry = self
            .inner
            .counters
            .entry(key.to_string())
            .or_insert(Window {
                count: 0,
                started: now,
            });
        let state = entry.value_mut();

        if now.duration_since(state.started) >= window {
            state.count = 0;
            state.started = now;
        }
        state.count = state.count.saturating_add(1);

        let reset_after = window.saturating_sub(now.duration_since(state.started));
        RateLimitDecision {
            allowed: state.count <= limit,
            limit,
            remaining: limit.saturating_sub(state.count),
            reset_after,
        }
    }

    /// Drop counters whose window has expired.
    pub fn sweep(&self) -> usize {
        let window = self.inner.window;
        let before = self.inner.counters.len();
        self.inner
            .counters
            .retain(|_, w| w.started.elapsed() < window);
        before.saturating_sub(self.inner.counters.len())
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.inner.counters.len()
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("tier", &self.inner.tier)
            .field("max_requests", &self.inner.max_requests)
            .field("window", &self.inner.window)
            .field("tracked_keys", &self.inner.counters.len())
            .finish()
    }
}

/// Periodically sweep expired counters until shutdown.
pub async fn run_sweeper(
    limiters: Vec<RateLimiter>,
    interval: Duration,
    mut shutdown: tokio::sync::broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                for limiter in &limiters {
                    let removed = limiter.sweep();
                    if removed > 0 {
                        tracing::debug!(tier = limiter.tier().as_str(), removed, "Swept expired rate-limit counters");
                    }
                }
            }
            _ = shutdown.recv() => break,
        }
    }
}

/// General tier: every route except the health check.
pub async fn general_rate_limit(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.uri().path() == HEALTH_PATH {
        return next.run(request).await;
    }
    enforce(&state, &state.general_limiter, request, next).await
}

/// API tier: `/api` routes, inside the general tier.
pub async fn api_rate_limit(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    enforce(&state, &state.api_limiter, request, next).await
}

async fn enforce(
    state: &AppState,
    limiter: &RateLimiter,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !limiter.is_enabled() {
        return next.run(request).await;
    }

    let key = request
        .extensions()
        .get::<ClientIp>()
        .map(|ip| ip.as_str().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let decision = limiter.check(&key);
    // the inner (API) tier's headers win over the general tier's
    let overwrite = limiter.tier() == Tier::Api;

    if decision.allowed {
        let mut response = next.run(request).await;
        decision.apply_headers(response.headers_mut(), overwrite);
        return response;
    }

    let meta = RequestMeta::from_request(&request);
    state.security_log.emit(
        SecurityEventKind::RateLimitExceeded,
        meta,
        details!(
            "tier" => limiter.tier().as_str(),
            "limit" => limiter.limit(),
            "window_secs" => limiter.window().as_secs(),
            "endpoint" => request.uri().path(),
        ),
    );
    metrics::record_rate_limited(limiter.tier().as_str());

    let mut response = GatewayError::RateLimitExceeded.into_response();
    decision.apply_headers(response.headers_mut(), true);
    response
}
