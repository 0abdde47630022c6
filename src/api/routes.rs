use crate::AppState;
use crate::api::ApiDoc;
use crate::api::handlers::{health, research};
use axum::{
    Json, Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

/// Routes of the submission boundary, without state or middleware.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/agent/start", post(research::start_task))
        .route("/agent/status/{task_id}", get(research::get_status))
        .route("/agent/cancel/{task_id}", post(research::cancel_task))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
}

/// The full application: routes, state, CORS for browser UIs and request
/// tracing.
pub fn build_app(state: AppState) -> Router {
    let router = create_router();

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/swagger.json", ApiDoc::openapi()),
    );

    router
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
