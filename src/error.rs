//! Request-path error taxonomy.
//!
//! Every variant maps to a fixed status code and a generic body. Detail
//! stays in the server-side logs; callers only learn the status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("rate limit exceeded")]
    RateLimitExceeded,
    #[error("missing credential")]
    AuthMissingCredential,
    #[error("invalid credential")]
    AuthInvalidCredential,
    #[error("payload too large")]
    PayloadTooLarge,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("{0} not configured")]
    ServiceUnavailable(&'static str),
    #[error("upstream request failed")]
    Upstream,
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::AuthMissingCredential => StatusCode::UNAUTHORIZED,
            GatewayError::AuthInvalidCredential => StatusCode::FORBIDDEN,
            GatewayError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Upstream => StatusCode::BAD_GATEWAY,
        }
    }

    /// Body text shown to the caller.
    pub fn public_message(&self) -> String {
        match self {
            GatewayError::RateLimitExceeded => {
                "Too many requests, please try again later.".to_string()
            }
            // Missing and invalid keys share one message
            GatewayError::AuthMissingCredential | GatewayError::AuthInvalidCredential => {
                "Authentication failed".to_string()
            }
            GatewayError::PayloadTooLarge => "Payload too large".to_string(),
            GatewayError::NotFound(what) => format!("{what} not found"),
            GatewayError::BadRequest(msg) => msg.clone(),
            GatewayError::ServiceUnavailable(what) => format!("{what} not configured"),
            GatewayError::Upstream => "Upstream request failed".to_string(),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.public_message() }))).into_response()
    }
}
