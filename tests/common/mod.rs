//! Shared utilities for gateway integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use agent_gateway::config::GatewayConfig;
use agent_gateway::http::{build_router, AppState};
use agent_gateway::security::{MemorySink, SecurityLog};
use axum::{
    body::Body,
    extract::connect_info::MockConnectInfo,
    http::{Request, Response},
    Router,
};
use serde_json::Value;
use tokio::net::TcpListener;
use tower::ServiceExt;

pub const TEST_KEY: &str = "test-key-0123456789abcdef";
pub const PEER: ([u8; 4], u16) = ([10, 0, 0, 1], 40000);

/// Config with a shared secret and the documented default tiers.
pub fn config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.auth.api_key = Some(TEST_KEY.to_string());
    config
}

/// A router wired to an in-memory security sink and a fixed socket peer.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub events: MemorySink,
}

impl TestApp {
    pub fn new(config: GatewayConfig) -> Self {
        let events = MemorySink::new();
        let state =
            AppState::new(config).with_security_log(SecurityLog::new(Arc::new(events.clone())));
        let router = build_router(state.clone()).layer(MockConnectInfo(SocketAddr::from(PEER)));
        Self {
            router,
            state,
            events,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub fn get(path: &str) -> Request<Body> {
    Request::builder().uri(path).body(Body::empty()).unwrap()
}

pub fn get_with_key(path: &str, key: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .header("x-api-key", key)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(path: &str, key: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("x-api-key", key)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn header<'a>(response: &'a Response<Body>, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

/// Serve `app` on an ephemeral loopback port.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// A loopback address nothing is listening on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
