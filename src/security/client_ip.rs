//! Client IP resolution behind a fixed number of trusted proxies.
//!
//! # Design Decisions
//! - Only the socket peer and the last `trusted_hops` entries of
//!   `X-Forwarded-For` are consulted; anything further left is client input
//! - The result is normalized (port stripped, IPv4-mapped IPv6 unwrapped)
//!   before it keys any rate-limit counter
//! - Resolved once per request and stored in request extensions

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};

use crate::http::server::AppState;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Normalized client address used as the rate-limit key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientIp(String);

impl ClientIp {
    pub fn new(ip: impl Into<String>) -> Self {
        Self(ip.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientIp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolve the client address from the socket peer and forwarding headers.
///
/// The address chain is the peer followed by `X-Forwarded-For` entries read
/// right to left. With `trusted_hops = N` the entry at index N is the
/// client; a shorter chain yields its furthest entry.
pub fn resolve_client_ip(peer: IpAddr, headers: &HeaderMap, trusted_hops: usize) -> ClientIp {
    if trusted_hops == 0 {
        return ClientIp(normalize_ip(&peer.to_string()));
    }

    let forwarded: Vec<&str> = headers
        .get_all(X_FORWARDED_FOR)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    // forwarded[len - k] is the address the k-th proxy saw
    let hops = trusted_hops.min(forwarded.len());
    if hops == 0 {
        return ClientIp(normalize_ip(&peer.to_string()));
    }
    ClientIp(normalize_ip(forwarded[forwarded.len() - hops]))
}

/// Strip any port suffix and canonicalize the address text.
///
/// `1.2.3.4:80` → `1.2.3.4`, `[::1]:80` → `::1`, `::ffff:1.2.3.4` →
/// `1.2.3.4`. Unparseable input is returned with the port removed.
pub fn normalize_ip(raw: &str) -> String {
    let raw = raw.trim();

    let host = if let Some(rest) = raw.strip_prefix('[') {
        match rest.find(']') {
            Some(end) => &rest[..end],
            None => rest,
        }
    } else if raw.parse::<IpAddr>().is_ok() {
        raw
    } else if let Ok(addr) = raw.parse::<SocketAddr>() {
        return addr.ip().to_canonical().to_string();
    } else if raw.matches(':').count() == 1 {
        raw.split(':').next().unwrap_or(raw)
    } else {
        raw
    };

    match host.parse::<IpAddr>() {
        Ok(ip) => ip.to_canonical().to_string(),
        Err(_) => host.to_string(),
    }
}

/// Middleware that resolves the client IP and attaches it to the request.
pub async fn client_ip_middleware(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let client_ip = resolve_client_ip(
        addr.ip(),
        request.headers(),
        state.config.proxy.trusted_hops,
    );
    tracing::trace!(peer = %addr, client_ip = %client_ip, "Resolved client IP");
    request.extensions_mut().insert(client_ip);
    next.run(request).await
}
