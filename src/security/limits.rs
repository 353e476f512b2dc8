//! Request body size guard.
//!
//! Every request body is held to `limits.max_body_bytes` before any
//! rate-limit quota is spent or any handler runs. A declared
//! `Content-Length` above the ceiling is refused without reading the body;
//! otherwise the body is buffered up to the ceiling and refused as soon as
//! it grows past it.

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::details;
use crate::error::GatewayError;
use crate::http::server::AppState;
use crate::security::events::{RequestMeta, SecurityEventKind};

/// Declared body length, if present and well-formed.
pub fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

pub async fn body_size_guard(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let max = state.config.limits.max_body_bytes;

    let meta = RequestMeta::from_request(&request);
    let declared = declared_length(request.headers());
    if let Some(length) = declared {
        if length > max as u64 {
            return reject(&state, meta, details!("content_length" => length, "limit" => max));
        }
    }

    // the declared length is not trusted for the read itself
    let (parts, body) = request.into_parts();
    match to_bytes(body, max).await {
        Ok(bytes) => next.run(Request::from_parts(parts, Body::from(bytes))).await,
        // a client that dropped mid-body never reads this response
        Err(e) => {
            tracing::debug!(error = %e, limit = max, "Request body over the limit");
            reject(&state, meta, details!("content_length" => declared, "limit" => max))
        }
    }
}

fn reject(
    state: &AppState,
    meta: RequestMeta,
    details: serde_json::Map<String, serde_json::Value>,
) -> Response {
    state
        .security_log
        .emit(SecurityEventKind::PayloadTooLarge, meta, details);
    GatewayError::PayloadTooLarge.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_content_length() {
        let mut headers = HeaderMap::new();
        assert_eq!(declared_length(&headers), None);
        headers.insert(header::CONTENT_LENGTH, "1024".parse().unwrap());
        assert_eq!(declared_length(&headers), Some(1024));
        headers.insert(header::CONTENT_LENGTH, "nope".parse().unwrap());
        assert_eq!(declared_length(&headers), None);
    }
}
