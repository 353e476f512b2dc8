//! Request header echo, mounted only when `debug.enabled` is set.
//!
//! Credentials are masked: the configured API key header plus the usual
//! authorization and cookie headers never appear in the output.

use axum::{extract::State, http::HeaderMap, Json};
use serde_json::{Map, Value};

use crate::http::server::AppState;

pub const REDACTED: &str = "[REDACTED]";

const ALWAYS_REDACTED: &[&str] = &["authorization", "proxy-authorization", "cookie", "set-cookie"];

pub fn redact_headers(headers: &HeaderMap, api_key_header: &str) -> Map<String, Value> {
    let api_key_header = api_key_header.to_ascii_lowercase();
    let mut out = Map::new();

    for name in headers.keys() {
        let key = name.as_str();
        let sensitive = key == api_key_header || ALWAYS_REDACTED.contains(&key);
        let values: Vec<Value> = headers
            .get_all(name)
            .iter()
            .map(|v| {
                if sensitive {
                    Value::from(REDACTED)
                } else {
                    Value::from(v.to_str().unwrap_or("<binary>"))
                }
            })
            .collect();

        let value = if values.len() == 1 {
            values.into_iter().next().unwrap_or(Value::Null)
        } else {
            Value::Array(values)
        };
        out.insert(key.to_string(), value);
    }

    out
}

pub async fn echo_headers(State(state): State<AppState>, headers: HeaderMap) -> Json<Value> {
    tracing::warn!("Debug header dump requested");
    let redacted = redact_headers(&headers, &state.config.auth.header);
    Json(Value::Object(redacted))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_credentials_only() {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", "secret".parse().unwrap());
        headers.insert("authorization", "Bearer secret".parse().unwrap());
        headers.insert("user-agent", "curl/8".parse().unwrap());
        headers.append("accept", "text/plain".parse().unwrap());
        headers.append("accept", "application/json".parse().unwrap());

        let out = redact_headers(&headers, "X-API-Key");
        assert_eq!(out["x-api-key"], REDACTED);
        assert_eq!(out["authorization"], REDACTED);
        assert_eq!(out["user-agent"], "curl/8");
        assert_eq!(out["accept"], serde_json::json!(["text/plain", "application/json"]));
    }
}
