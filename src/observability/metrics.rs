//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, route, status
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `gateway_rate_limited_total` (counter): rejections by tier
//! - `gateway_auth_decisions_total` (counter): authentication outcomes
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::Next,
    response::Response,
};
use ::metrics::Label;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with an HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    let route_labels = vec![
        Label::new("method", method.to_string()),
        Label::new("route", route.to_string()),
    ];
    let mut labels = route_labels.clone();
    labels.push(Label::new("status", status.to_string()));

    ::metrics::counter!("gateway_requests_total", labels).increment(1);
    ::metrics::histogram!("gateway_request_duration_seconds", route_labels)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited(tier: &'static str) {
    ::metrics::counter!("gateway_rate_limited_total", "tier" => tier).increment(1);
}

pub fn record_auth(outcome: &'static str) {
    ::metrics::counter!("gateway_auth_decisions_total", "outcome" => outcome).increment(1);
}

/// Middleware recording request count and latency per matched route.
pub async fn track_requests(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    record_request(&method, &route, response.status().as_u16(), start);
    response
}
