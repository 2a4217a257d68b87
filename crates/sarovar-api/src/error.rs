use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use sarovar_core::error::SarovarError;
use sarovar_session::SessionError;

/// Unified API error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<String>,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into(), details: None }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// The session is in the wrong phase for the request.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody { error: self.message, details: self.details };
        (self.status, Json(body)).into_response()
    }
}

impl From<SarovarError> for ApiError {
    fn from(err: SarovarError) -> Self {
        match &err {
            SarovarError::Parse { .. }
            | SarovarError::Validation { .. }
            | SarovarError::Conversion { .. }
            | SarovarError::InvalidGeometry { .. } => Self::bad_request(err.to_string()),
            SarovarError::EmptyResult { .. } => Self::unprocessable(err.to_string()),
            SarovarError::UnknownModule { .. } => Self::not_found(err.to_string()),
            SarovarError::Backend(backend) if backend.is_permission() => {
                Self::forbidden("Backend permission denied").with_details(err.to_string())
            }
            SarovarError::Backend(_) => Self::bad_gateway("Backend request failed").with_details(err.to_string()),
            _ => Self::internal("Internal error").with_details(err.to_string()),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NoRoi
            | SessionError::RoiAlreadyLocked
            | SessionError::NothingStaged
            | SessionError::NoModule
            | SessionError::Transition(_) => Self::conflict(err.to_string()),
            SessionError::UnknownModule(_) => Self::not_found(err.to_string()),
            SessionError::PermissionDenied { message, remediation } => {
                Self::forbidden(message).with_details(remediation)
            }
            SessionError::Core(core) => core.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sarovar_core::error::BackendError;

    #[test]
    fn test_session_error_status() {
        assert_eq!(ApiError::from(SessionError::NoRoi).status, StatusCode::CONFLICT);
        assert_eq!(ApiError::from(SessionError::RoiAlreadyLocked).status, StatusCode::CONFLICT);

        let err = ApiError::from(SessionError::PermissionDenied {
            message: "Permission denied".to_string(),
            remediation: "Enable the API for project=demo".to_string(),
        });
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.details.as_deref(), Some("Enable the API for project=demo"));
    }

    #[test]
    fn test_core_error_status() {
        let err: ApiError = SarovarError::empty_result("flood scenes").into();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);

        let err: ApiError = SarovarError::Backend(BackendError::Timeout { seconds: 5 }).into();
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);

        let err: ApiError =
            SessionError::Core(SarovarError::Backend(BackendError::PermissionDenied {
                message: "no access".to_string(),
            }))
            .into();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }
}
