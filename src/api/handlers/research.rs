//! Research task handlers
//!
//! The pull-based submission boundary: start a task, then poll its status
//! until it reaches a terminal state.

use crate::{
    AppState,
    types::{InvestigationRequest, Result, TaskId, TaskStatus},
};
use axum::{
    Json,
    extract::{Path, State},
};

/// Start a research task
///
/// Validates the request, schedules the research agent in the background and
/// returns the task's initial status immediately.
#[utoipa::path(
    post,
    path = "/agent/start",
    request_body = InvestigationRequest,
    responses(
        (status = 200, description = "Task accepted", body = TaskStatus),
        (status = 400, description = "No non-empty field in the request")
    ),
    tag = "agent"
)]
pub async fn start_task(
    State(state): State<AppState>,
    Json(payload): Json<InvestigationRequest>,
) -> Result<Json<TaskStatus>> {
    let task_id = state.dispatcher.submit(payload)?;
    let status = state.dispatcher.poll(task_id)?;
    Ok(Json(TaskStatus::clone(&status)))
}

/// Get the current status of a task
#[utoipa::path(
    get,
    path = "/agent/status/{task_id}",
    responses(
        (status = 200, description = "Current task snapshot", body = TaskStatus),
        (status = 404, description = "Unknown task_id")
    ),
    params(
        ("task_id" = String, Path, description = "Identifier returned by /agent/start")
    ),
    tag = "agent"
)]
pub async fn get_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskStatus>> {
    let task_id: TaskId = task_id.parse()?;
    let status = state.dispatcher.poll(task_id)?;
    Ok(Json(TaskStatus::clone(&status)))
}

/// Cancel a running task
///
/// The agent stops at its next tool-call boundary. Cancelling a finished
/// task returns its final status unchanged.
#[utoipa::path(
    post,
    path = "/agent/cancel/{task_id}",
    responses(
        (status = 200, description = "Task snapshot after cancellation", body = TaskStatus),
        (status = 404, description = "Unknown task_id")
    ),
    params(
        ("task_id" = String, Path, description = "Identifier returned by /agent/start")
    ),
    tag = "agent"
)]
pub async fn cancel_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskStatus>> {
    let task_id: TaskId = task_id.parse()?;
    let status = state.dispatcher.cancel(task_id)?;
    Ok(Json(TaskStatus::clone(&status)))
}
