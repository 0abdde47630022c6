//! HTTP API Handlers and Routes
//!
//! The submission boundary over HTTP, built on the Axum web framework.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//!
//! # API Endpoints
//!
//! ## Agent (`/agent`)
//! - `POST /agent/start` - Submit an investigation request, returns the initial status
//! - `GET /agent/status/{task_id}` - Current status snapshot (404 for unknown ids)
//! - `POST /agent/cancel/{task_id}` - Cancel a running task
//!
//! ## Health
//! - `GET /health` - Server liveness and tool server reachability
//!
//! # OpenAPI Documentation
//!
//! The OpenAPI document is served at `/api-docs/openapi.json`. When the
//! `swagger-ui` feature is enabled, interactive documentation is available at
//! `/swagger-ui/`.

use utoipa::OpenApi;

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;

/// OpenAPI description of the HTTP surface.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::research::start_task,
        handlers::research::get_status,
        handlers::research::cancel_task,
    ),
    components(schemas(
        crate::types::InvestigationRequest,
        crate::types::TaskStatus,
        crate::types::TaskState,
        crate::types::TaskId,
        crate::types::LogEntry,
        crate::types::Finding,
        handlers::health::HealthResponse,
    )),
    tags(
        (name = "agent", description = "Research task submission and polling"),
        (name = "health", description = "Liveness probes")
    )
)]
pub struct ApiDoc;
