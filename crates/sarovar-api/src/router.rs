use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers;
use crate::state::AppState;

/// Create the API router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health
        .route("/health", get(handlers::health_check))

        // Modules
        .route("/api/v1/modules", get(handlers::list_modules))

        // Sessions
        .route("/api/v1/sessions", post(handlers::create_session))
        .route(
            "/api/v1/sessions/{session_id}",
            get(handlers::get_session).delete(handlers::delete_session),
        )

        // ROI lifecycle (session-scoped)
        .route(
            "/api/v1/sessions/{session_id}/roi",
            post(handlers::submit_roi).delete(handlers::discard_roi),
        )

        // Analysis (session-scoped)
        .route("/api/v1/sessions/{session_id}/module", put(handlers::select_module))
        .route("/api/v1/sessions/{session_id}/run", post(handlers::run_analysis))
        .route("/api/v1/sessions/{session_id}/export", post(handlers::export_result))
        .route("/api/v1/sessions/{session_id}/static-map", post(handlers::static_map))

        .with_state(state)
}
