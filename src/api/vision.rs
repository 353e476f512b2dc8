//! Pass-through proxy to the vision/LLM API.
//!
//! The request body is forwarded unchanged; the upstream status, content
//! type and body are relayed back.

use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, HeaderValue, Response},
    response::IntoResponse,
};

use crate::error::GatewayError;
use crate::http::server::AppState;

pub async fn analyze(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, GatewayError> {
    let vision = &state.config.vision;
    let endpoint = vision
        .endpoint
        .as_deref()
        .ok_or(GatewayError::ServiceUnavailable("Vision service"))?;

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("application/json"));

    let mut upstream = state
        .http_client
        .post(endpoint)
        .header(header::CONTENT_TYPE, content_type)
        .timeout(Duration::from_secs(vision.timeout_secs))
        .body(body);
    if let Some(key) = &vision.api_key {
        upstream = upstream.bearer_auth(key);
    }

    let response = upstream.send().await.map_err(|e| {
        tracing::error!(error = %e, "Vision upstream request failed");
        GatewayError::Upstream
    })?;

    let status = response.status();
    let content_type = response.headers().get(header::CONTENT_TYPE).cloned();
    let bytes = response.bytes().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to read vision upstream body");
        GatewayError::Upstream
    })?;

    tracing::debug!(status = %status, bytes = bytes.len(), "Vision upstream responded");

    let mut relayed = Response::new(Body::from(bytes));
    *relayed.status_mut() = status;
    if let Some(content_type) = content_type {
        relayed.headers_mut().insert(header::CONTENT_TYPE, content_type);
    }
    Ok(relayed)
}
