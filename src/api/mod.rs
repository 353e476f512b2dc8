//! `/api` routes. Every route here sits behind the API rate-limit tier
//! and API key authentication (see `http::server`).

pub mod agents;
pub mod debug;
pub mod vision;

use axum::{
    routing::{get, post},
    Router,
};

use crate::config::GatewayConfig;
use crate::http::server::AppState;

pub fn router(config: &GatewayConfig) -> Router<AppState> {
    let mut router = Router::new()
        .route("/agents", get(agents::list_agents))
        .route("/agents/select", post(agents::select))
        .route("/agents/{name}", get(agents::get_agent))
        .route("/vision/analyze", post(vision::analyze));

    if config.debug.enabled {
        tracing::warn!("Debug endpoints enabled: /api/debug/headers");
        router = router.route("/debug/headers", get(debug::echo_headers));
    }

    router
}
