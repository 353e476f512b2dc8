//! Structured security event log.
//!
//! Every authentication decision and every rejection produces exactly one
//! [`SecurityEvent`]. Events are immutable once built and are handed to a
//! [`SecuritySink`]; the default sink writes them to `tracing` under the
//! `security` target.

use std::fmt;
use std::sync::{Arc, Mutex};

use axum::http::{header, Request};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::http::request::RequestIdExt;
use crate::security::client_ip::ClientIp;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecurityEventKind {
    RateLimitExceeded,
    AuthAttempt,
    AuthDevMode,
    AuthMissingKey,
    AuthInvalidKey,
    AuthSuccess,
    PayloadTooLarge,
}

impl SecurityEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityEventKind::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            SecurityEventKind::AuthAttempt => "AUTH_ATTEMPT",
            SecurityEventKind::AuthDevMode => "AUTH_DEV_MODE",
            SecurityEventKind::AuthMissingKey => "AUTH_MISSING_KEY",
            SecurityEventKind::AuthInvalidKey => "AUTH_INVALID_KEY",
            SecurityEventKind::AuthSuccess => "AUTH_SUCCESS",
            SecurityEventKind::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
        }
    }

    fn is_failure(&self) -> bool {
        matches!(
            self,
            SecurityEventKind::RateLimitExceeded
                | SecurityEventKind::AuthMissingKey
                | SecurityEventKind::AuthInvalidKey
                | SecurityEventKind::PayloadTooLarge
        )
    }
}

impl fmt::Display for SecurityEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request attributes copied into every event.
#[derive(Debug, Clone, Serialize)]
pub struct RequestMeta {
    pub ip: String,
    pub method: String,
    pub path: String,
    pub user_agent: Option<String>,
    pub request_id: Option<String>,
}

impl RequestMeta {
    pub fn from_request<B>(request: &Request<B>) -> Self {
        let ip = request
            .extensions()
            .get::<ClientIp>()
            .map(|ip| ip.as_str().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        Self {
            ip,
            method: request.method().to_string(),
            path: request.uri().path().to_string(),
            user_agent: request
                .headers()
                .get(header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            request_id: request.request_id().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SecurityEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: SecurityEventKind,
    #[serde(flatten)]
    pub request: RequestMeta,
    pub details: Map<String, Value>,
}

impl SecurityEvent {
    pub fn new(kind: SecurityEventKind, request: RequestMeta, details: Map<String, Value>) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            request,
            details,
        }
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.get(key)
    }
}

/// Destination for security events. Must not block.
pub trait SecuritySink: Send + Sync {
    fn record(&self, event: SecurityEvent);
}

/// Writes events through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl SecuritySink for TracingSink {
    fn record(&self, event: SecurityEvent) {
        let json = serde_json::to_string(&event).unwrap_or_default();
        if event.kind.is_failure() {
            tracing::warn!(
                target: "security",
                kind = %event.kind,
                ip = %event.request.ip,
                method = %event.request.method,
                path = %event.request.path,
                event = %json,
                "Security event"
            );
        } else if event.kind == SecurityEventKind::AuthDevMode {
            tracing::warn!(
                target: "security",
                kind = %event.kind,
                ip = %event.request.ip,
                path = %event.request.path,
                event = %json,
                "API key not configured, admitting request without authentication"
            );
        } else {
            tracing::info!(
                target: "security",
                kind = %event.kind,
                ip = %event.request.ip,
                method = %event.request.method,
                path = %event.request.path,
                event = %json,
                "Security event"
            );
        }
    }
}

/// Keeps events in memory. Used by tests and diagnostics.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<SecurityEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SecurityEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn kinds(&self) -> Vec<SecurityEventKind> {
        self.events().into_iter().map(|e| e.kind).collect()
    }

    pub fn count(&self, kind: SecurityEventKind) -> usize {
        self.events().iter().filter(|e| e.kind == kind).count()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl SecuritySink for MemorySink {
    fn record(&self, event: SecurityEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Cloneable handle the middleware uses to emit events.
#[derive(Clone)]
pub struct SecurityLog {
    sink: Arc<dyn SecuritySink>,
}

impl SecurityLog {
    pub fn new(sink: Arc<dyn SecuritySink>) -> Self {
        Self { sink }
    }

    pub fn tracing() -> Self {
        Self::new(Arc::new(TracingSink))
    }

    pub fn emit(&self, kind: SecurityEventKind, request: RequestMeta, details: Map<String, Value>) {
        self.sink.record(SecurityEvent::new(kind, request, details));
    }
}

impl Default for SecurityLog {
    fn default() -> Self {
        Self::tracing()
    }
}

impl fmt::Debug for SecurityLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityLog").finish_non_exhaustive()
    }
}

/// Build a details map from `key => value` pairs.
#[macro_export]
macro_rules! details {
    () => { ::serde_json::Map::new() };
    ($($key:literal => $value:expr),+ $(,)?) => {{
        let mut map = ::serde_json::Map::new();
        $( map.insert($key.to_string(), ::serde_json::json!($value)); )+
        map
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn kind_serializes_in_screaming_snake_case() {
        let value = serde_json::to_value(SecurityEventKind::RateLimitExceeded).unwrap();
        assert_eq!(value, "RATE_LIMIT_EXCEEDED");
        assert_eq!(SecurityEventKind::AuthDevMode.to_string(), "AUTH_DEV_MODE");
    }

    #[test]
    fn meta_reads_resolved_ip_and_user_agent() {
        let mut request = Request::builder()
            .method("POST")
            .uri("/api/agents/select?x=1")
            .header("User-Agent", "curl/8.0")
            .body(Body::empty())
            .unwrap();
        request.extensions_mut().insert(ClientIp::new("10.1.2.3"));

        let meta = RequestMeta::from_request(&request);
        assert_eq!(meta.ip, "10.1.2.3");
        assert_eq!(meta.method, "POST");
        assert_eq!(meta.path, "/api/agents/select");
        assert_eq!(meta.user_agent.as_deref(), Some("curl/8.0"));
    }

    #[test]
    fn event_json_is_flat() {
        let sink = MemorySink::new();
        let log = SecurityLog::new(Arc::new(sink.clone()));
        let meta = RequestMeta {
            ip: "1.1.1.1".into(),
            method: "GET".into(),
            path: "/api/agents".into(),
            user_agent: None,
            request_id: None,
        };
        log.emit(
            SecurityEventKind::AuthInvalidKey,
            meta,
            crate::details!("reason" => "key_mismatch"),
        );

        let events = sink.events();
        assert_eq!(events.len(), 1);
        let json = serde_json::to_value(&events[0]).unwrap();
        assert_eq!(json["kind"], "AUTH_INVALID_KEY");
        assert_eq!(json["ip"], "1.1.1.1");
        assert_eq!(json["details"]["reason"], "key_mismatch");
    }
}
