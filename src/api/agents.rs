use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Deserialize;

use crate::agents::{select_agents, AgentProfile, Selection};
use crate::error::GatewayError;
use crate::http::server::AppState;

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    #[serde(default)]
    pub task: String,
}

pub async fn list_agents(State(state): State<AppState>) -> Json<&'static [AgentProfile]> {
    Json(state.catalog.all())
}

pub async fn get_agent(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<AgentProfile>, GatewayError> {
    state
        .catalog
        .get(&name)
        .copied()
        .map(Json)
        .ok_or(GatewayError::NotFound("Agent"))
}

pub async fn select(
    State(state): State<AppState>,
    payload: Result<Json<SelectRequest>, JsonRejection>,
) -> Result<Json<Selection>, GatewayError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected agent selection body");
        GatewayError::BadRequest("Invalid request body".to_string())
    })?;

    let task = request.task.trim();
    if task.is_empty() {
        return Err(GatewayError::BadRequest("Task description is required".to_string()));
    }

    let selection = select_agents(&state.catalog, task);
    tracing::info!(
        agents = ?selection.execution_order,
        fallback = selection.fallback,
        "Agents selected"
    );
    Ok(Json(selection))
}
