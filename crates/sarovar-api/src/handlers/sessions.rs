use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::dto::{DeleteResponse, SessionResponse};
use crate::error::ApiError;
use crate::services::SessionService;
use crate::state::AppState;

pub async fn create_session(State(state): State<Arc<AppState>>) -> (StatusCode, Json<SessionResponse>) {
    let id = state.create_session();
    tracing::info!(session_id = %id, open = state.session_count(), "Session created");

    let response = SessionResponse::new(id, &Default::default());
    (StatusCode::CREATED, Json(response))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let id = SessionService::parse_id(&session_id)?;

    let response =
        SessionService::with_session(&state, id, |id, session| Ok(SessionResponse::new(id, session.state())))
            .await?;
    Ok(Json(response))
}

pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    tracing::info!(session_id = %session_id, "Deleting session");

    let id = SessionService::parse_id(&session_id)?;
    if !state.remove_session(id) {
        return Err(ApiError::not_found("Session not found"));
    }

    Ok(Json(DeleteResponse::success("session", &session_id)))
}
