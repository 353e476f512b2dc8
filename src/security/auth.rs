//! Shared-secret API key authentication.
//!
//! # Design Decisions
//! - The secret is an explicit [`Credential`]; `Unconfigured` is the
//!   development mode where `/api` is open to anyone
//! - Comparison never short-circuits: a key of the wrong length is still
//!   compared byte-for-byte against a buffer of the expected length
//! - Callers see one body for "missing" and "wrong"; only the status differs
//!
//! # Deployment risk
//! Running without `auth.api_key` (or `GATEWAY_API_KEY`) leaves every `/api`
//! route unauthenticated. Each such request logs `AUTH_DEV_MODE`.

use std::fmt;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::{Choice, ConstantTimeEq};

use crate::details;
use crate::error::GatewayError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::events::{RequestMeta, SecurityEventKind};

/// The process-wide shared secret.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// No secret configured: development mode, requests are admitted.
    Unconfigured,
    Configured(String),
}

impl Credential {
    pub fn from_option(secret: Option<String>) -> Self {
        match secret {
            Some(secret) if !secret.is_empty() => Credential::Configured(secret),
            _ => Credential::Unconfigured,
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, Credential::Configured(_))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Unconfigured => f.write_str("Unconfigured"),
            Credential::Configured(_) => f.write_str("Configured([REDACTED])"),
        }
    }
}

/// Why a presented key was refused. Logged only, never returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMismatch {
    Length,
    Content,
}

impl KeyMismatch {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyMismatch::Length => "length_mismatch",
            KeyMismatch::Content => "key_mismatch",
        }
    }
}

/// Compare a presented key with the expected one in constant time.
///
/// The presented bytes are copied into a zeroed buffer of the expected
/// length and that buffer is compared in full, so the work done depends
/// only on the expected length. The length check itself is also
/// constant-time and is folded in at the end.
pub fn verify_key(presented: &[u8], expected: &[u8]) -> Result<(), KeyMismatch> {
    let mut candidate = vec![0u8; expected.len()];
    let n = presented.len().min(expected.len());
    candidate[..n].copy_from_slice(&presented[..n]);

    let content_eq: Choice = candidate.as_slice().ct_eq(expected);
    let length_eq: Choice = (presented.len() as u64).ct_eq(&(expected.len() as u64));

    if bool::from(content_eq & length_eq) {
        Ok(())
    } else if !bool::from(length_eq) {
        Err(KeyMismatch::Length)
    } else {
        Err(KeyMismatch::Content)
    }
}

/// Read the presented key as raw bytes. Header names are
/// case-insensitive, so `X-API-Key`, `x-api-key` and `X-Api-Key` all
/// resolve here. A value that is not valid UTF-8 still counts as presented.
pub fn presented_key<'a>(headers: &'a HeaderMap, header: &str) -> Option<&'a [u8]> {
    headers
        .get(header)
        .map(|v| v.as_bytes().trim_ascii())
        .filter(|v| !v.is_empty())
}

/// Outcome of authenticating one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    DevMode,
    Authenticated,
    Missing,
    Invalid(KeyMismatch),
}

impl AuthOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthOutcome::DevMode => "dev_mode",
            AuthOutcome::Authenticated => "success",
            AuthOutcome::Missing => "missing",
            AuthOutcome::Invalid(_) => "invalid",
        }
    }
}

pub fn authenticate(credential: &Credential, presented: Option<&[u8]>) -> AuthOutcome {
    let expected = match credential {
        Credential::Unconfigured => return AuthOutcome::DevMode,
        Credential::Configured(secret) => secret,
    };
    let Some(presented) = presented else {
        return AuthOutcome::Missing;
    };
    match verify_key(presented, expected.as_bytes()) {
        Ok(()) => AuthOutcome::Authenticated,
        Err(mismatch) => AuthOutcome::Invalid(mismatch),
    }
}

/// Middleware guarding `/api` routes.
pub async fn api_key_auth(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let presented = presented_key(request.headers(), &state.config.auth.header);
    let meta = RequestMeta::from_request(&request);
    let log = &state.security_log;

    log.emit(
        SecurityEventKind::AuthAttempt,
        meta.clone(),
        details!(
            "has_key" => presented.is_some(),
            "key_length" => presented.map(<[u8]>::len).unwrap_or(0),
        ),
    );

    let outcome = authenticate(&state.credential, presented);
    metrics::record_auth(outcome.as_str());

    match outcome {
        AuthOutcome::DevMode => {
            log.emit(
                SecurityEventKind::AuthDevMode,
                meta,
                details!("warning" => "no API key configured; authentication disabled"),
            );
            next.run(request).await
        }
        AuthOutcome::Authenticated => {
            log.emit(SecurityEventKind::AuthSuccess, meta, details!());
            next.run(request).await
        }
        AuthOutcome::Missing => {
            log.emit(SecurityEventKind::AuthMissingKey, meta, details!());
            GatewayError::AuthMissingCredential.into_response()
        }
        AuthOutcome::Invalid(mismatch) => {
            log.emit(
                SecurityEventKind::AuthInvalidKey,
                meta,
                details!("reason" => mismatch.as_str()),
            );
            GatewayError::AuthInvalidCredential.into_response()
        }
    }
}
