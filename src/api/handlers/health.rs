//! Health check handler

use crate::AppState;
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Always `ok` while the server is accepting requests
    pub status: String,
    /// `ok`, or `unreachable: <reason>` when the tool server probe fails or
    /// does not answer within `server.health_probe_timeout_ms`
    pub tools: String,
    /// Number of tasks known to this process
    pub tasks: usize,
    pub version: String,
}

/// Liveness of the server and reachability of the tool server
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Server is up", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let bound = Duration::from_millis(
        state.config_manager.config().server.health_probe_timeout_ms,
    );
    let tools = match tokio::time::timeout(bound, state.tools.health()).await {
        Ok(Ok(())) => "ok".to_string(),
        Ok(Err(failure)) => format!("unreachable: {}", failure),
        Err(_) => format!("unreachable: no answer within {}ms", bound.as_millis()),
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        tools,
        tasks: state.dispatcher.store().len(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
