use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::dto::{RoiRequest, RoiResponse, SessionResponse};
use crate::error::ApiError;
use crate::services::SessionService;
use crate::state::AppState;

/// Resolve, classify and lock an ROI, or stage an unconfirmed drawing.
pub async fn submit_roi(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(request): Json<RoiRequest>,
) -> Result<(StatusCode, Json<RoiResponse>), ApiError> {
    let id = SessionService::parse_id(&session_id)?;

    SessionService::with_session(&state, id, move |id, session| {
        let (status, region) = match (&request, request.input()) {
            (_, Some(input)) => {
                tracing::info!(session_id = %id, mode = input.mode_name(), "Submitting ROI");
                (StatusCode::OK, Some(session.submit_roi(&input)?))
            }
            (RoiRequest::DrawnShape { shape, .. }, None) => {
                session.stage_drawing(shape.clone())?;
                (StatusCode::ACCEPTED, None)
            }
            (_, None) => (StatusCode::OK, Some(session.confirm_drawing()?)),
        };

        let response = RoiResponse {
            staged: region.is_none(),
            region,
            session: SessionResponse::new(id, session.state()),
        };
        Ok((status, Json(response)))
    })
    .await
    .inspect_err(|e| tracing::warn!(session_id = %session_id, error = %e.message, "ROI submission failed"))
}

/// Clear the ROI and everything derived from it.
pub async fn discard_roi(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let id = SessionService::parse_id(&session_id)?;

    SessionService::with_session(&state, id, |id, session| {
        tracing::info!(session_id = %id, "Discarding ROI");
        session.discard_roi()?;
        Ok(Json(SessionResponse::new(id, session.state())))
    })
    .await
}
