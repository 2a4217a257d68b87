use std::sync::PoisonError;

use uuid::Uuid;

use sarovar_session::Orchestrator;

use crate::error::ApiError;
use crate::state::AppState;

/// Runs orchestrator steps off the async executor
///
/// Backend calls block, so every step that may reach the backend goes
/// through [`SessionService::with_session`].
pub struct SessionService;

impl SessionService {
    pub fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
        raw.parse().map_err(|_| ApiError::bad_request("Invalid session ID format"))
    }

    /// Lock the session and run `step` on the blocking pool.
    pub async fn with_session<T, F>(state: &AppState, id: Uuid, step: F) -> Result<T, ApiError>
    where
        F: FnOnce(Uuid, &mut Orchestrator) -> Result<T, ApiError> + Send + 'static,
        T: Send + 'static,
    {
        let session = state.session(id).ok_or_else(|| ApiError::not_found("Session not found"))?;

        tokio::task::spawn_blocking(move || {
            let mut orchestrator = session.lock().unwrap_or_else(PoisonError::into_inner);
            step(id, &mut orchestrator)
        })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, session_id = %id, "Session step panicked");
            ApiError::internal("Session step failed").with_details(e.to_string())
        })?
    }
}
