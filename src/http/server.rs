//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up the gateway chain (body guard, client IP, rate limits, auth)
//! - Wire up ambient middleware (request ID, tracing, timeout, metrics)
//! - Bind server to listener and run until shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::agents::AgentCatalog;
use crate::api;
use crate::config::GatewayConfig;
use crate::http::health::{health, HEALTH_PATH};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::observability::metrics::track_requests;
use crate::security::auth::{api_key_auth, Credential};
use crate::security::client_ip::client_ip_middleware;
use crate::security::events::SecurityLog;
use crate::security::limits::body_size_guard;
use crate::security::rate_limit::{
    api_rate_limit, general_rate_limit, run_sweeper, RateLimiter, Tier,
};

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub credential: Arc<Credential>,
    pub general_limiter: RateLimiter,
    pub api_limiter: RateLimiter,
    pub security_log: SecurityLog,
    pub catalog: AgentCatalog,
    pub http_client: reqwest::Client,
    pub started_at: Instant,
}

impl AppState {
    /// Build fresh state: new counters, tracing security sink.
    pub fn new(config: GatewayConfig) -> Self {
        let credential = Credential::from_option(config.auth.api_key.clone());
        Self {
            general_limiter: RateLimiter::from_config(Tier::General, &config.rate_limit.general),
            api_limiter: RateLimiter::from_config(Tier::Api, &config.rate_limit.api),
            credential: Arc::new(credential),
            security_log: SecurityLog::tracing(),
            catalog: AgentCatalog::new(),
            http_client: reqwest::Client::new(),
            started_at: Instant::now(),
            config: Arc::new(config),
        }
    }

    /// Replace the security event sink.
    pub fn with_security_log(mut self, security_log: SecurityLog) -> Self {
        self.security_log = security_log;
        self
    }
}

/// Build the Axum router with all middleware layers.
///
/// Layer order, outermost first: request ID, trace, timeout, client IP,
/// body size guard, general tier (skips
/// [`HEALTH_PATH`]), metrics; `/api` routes then add the API tier and auth.
#[allow(deprecated)]
pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    let api = api::router(&config)
        .route_layer(from_fn_with_state(state.clone(), api_key_auth))
        .route_layer(from_fn_with_state(state.clone(), api_rate_limit));

    Router::new()
        .route(HEALTH_PATH, get(health))
        .nest("/api", api)
        .with_state(state.clone())
        .layer(from_fn(track_requests))
        .layer(from_fn_with_state(state.clone(), general_rate_limit))
        .layer(DefaultBodyLimit::disable())
        .layer(from_fn_with_state(state.clone(), body_size_guard))
        .layer(from_fn_with_state(state, client_ip_middleware))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.listener.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(propagate_request_id_layer())
        .layer(set_request_id_layer())
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    state: AppState,
    router: Router,
}

impl GatewayServer {
    pub fn new(config: GatewayConfig) -> Self {
        Self::with_state(AppState::new(config))
    }

    pub fn with_state(state: AppState) -> Self {
        if !state.credential.is_configured() {
            tracing::warn!(
                "No API key configured: /api routes accept unauthenticated requests. \
                 Set auth.api_key or GATEWAY_API_KEY before exposing this server."
            );
        }
        let router = build_router(state.clone());
        Self { state, router }
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        let config = &self.state.config;
        tracing::info!(
            address = %addr,
            trusted_hops = config.proxy.trusted_hops,
            general_limit = config.rate_limit.general.max_requests,
            api_limit = config.rate_limit.api.max_requests,
            "HTTP server starting"
        );

        let sweeper = tokio::spawn(run_sweeper(
            vec![
                self.state.general_limiter.clone(),
                self.state.api_limiter.clone(),
            ],
            Duration::from_secs(config.rate_limit.sweep_interval_secs),
            shutdown.resubscribe(),
        ));

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        let mut shutdown = shutdown;
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        sweeper.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.state.config
    }
}
