use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use sarovar_core::ports::{ExportTicket, RecordingMap, RecordingPanel};
use sarovar_session::StaticMapRequest;

use crate::dto::{
    ModuleResponse, ModuleSelectionResponse, RunRequest, RunResponse, SelectModuleRequest, SessionResponse,
    StaticMapBody,
};
use crate::error::ApiError;
use crate::services::SessionService;
use crate::state::AppState;

/// Select a module and return its widgets for the session's region.
pub async fn select_module(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(request): Json<SelectModuleRequest>,
) -> Result<Json<ModuleSelectionResponse>, ApiError> {
    let id = SessionService::parse_id(&session_id)?;

    SessionService::with_session(&state, id, move |id, session| {
        tracing::info!(session_id = %id, module = %request.module, "Selecting module");
        session.select_module(&request.module)?;
        if let Some(raw) = &request.parameters {
            session.derive_parameters(raw)?;
        }

        let module = ModuleResponse { descriptor: session.descriptor()?, schema: session.schema()? };
        Ok(Json(ModuleSelectionResponse { module, session: SessionResponse::new(id, session.state()) }))
    })
    .await
}

/// Run the selected module over the locked ROI.
pub async fn run_analysis(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(request): Json<RunRequest>,
) -> Result<Json<RunResponse>, ApiError> {
    let id = SessionService::parse_id(&session_id)?;

    SessionService::with_session(&state, id, move |id, session| {
        if let Some(raw) = &request.parameters {
            session.derive_parameters(raw)?;
        }

        let mut map = RecordingMap::new();
        let mut panel = RecordingPanel::new();
        let result = session.run(&mut map, &mut panel).map_err(|e| {
            tracing::error!(session_id = %id, error = %e, "Analysis run failed");
            ApiError::from(e)
        })?;
        let result = result.clone();

        tracing::info!(
            session_id = %id,
            module = %result.module,
            has_raster = result.has_raster(),
            "Analysis run finished"
        );
        Ok(Json(RunResponse { result, map, panel, session: SessionResponse::new(id, session.state()) }))
    })
    .await
}

/// Start an export of the last result.
pub async fn export_result(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<ExportTicket>, ApiError> {
    let id = SessionService::parse_id(&session_id)?;

    SessionService::with_session(&state, id, |_, session| Ok(Json(session.export()?))).await
}

/// Build a printable map of the last result.
pub async fn static_map(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(body): Json<StaticMapBody>,
) -> Result<Json<StaticMapRequest>, ApiError> {
    let id = SessionService::parse_id(&session_id)?;

    SessionService::with_session(&state, id, move |_, session| {
        Ok(Json(session.static_map(body.title.as_deref())?))
    })
    .await
}
