//! Error types for GeoSarovar

use thiserror::Error;

/// Console page used to enable the service-usage API for a project.
const SERVICE_USAGE_URL: &str =
    "https://console.cloud.google.com/apis/library/serviceusage.googleapis.com";

#[derive(Debug, Error)]
pub enum SarovarError {
    // ROI input errors
    #[error("Could not parse boundary file: {reason}")]
    Parse { reason: String },

    #[error("Invalid value for {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Could not convert drawn shape: {reason}")]
    Conversion { reason: String },

    #[error("Invalid geometry: {reason}")]
    InvalidGeometry { reason: String },

    // Analysis errors
    #[error("No matching records for {what}")]
    EmptyResult { what: String },

    #[error("Unknown analysis module: {id}")]
    UnknownModule { id: String },

    #[error(transparent)]
    Backend(#[from] BackendError),

    // Configuration errors
    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SarovarError {
    pub fn parse(reason: impl Into<String>) -> Self {
        Self::Parse { reason: reason.into() }
    }

    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation { field: field.into(), reason: reason.into() }
    }

    pub fn conversion(reason: impl Into<String>) -> Self {
        Self::Conversion { reason: reason.into() }
    }

    pub fn empty_result(what: impl Into<String>) -> Self {
        Self::EmptyResult { what: what.into() }
    }
}

/// Failure reported by the remote compute backend.
///
/// Only the permission category is acted upon differently; every other
/// variant is surfaced as a generic backend failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("Permission denied by compute backend: {message}")]
    PermissionDenied { message: String },

    #[error("Compute backend timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Compute backend rejected the request: {message}")]
    Rejected { message: String },

    #[error("Could not reach compute backend: {message}")]
    Transport { message: String },
}

impl BackendError {
    /// Classify a raw backend message.
    ///
    /// Messages mentioning the service-usage API or a permission problem
    /// become [`BackendError::PermissionDenied`].
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.contains("serviceUsage") || message.to_lowercase().contains("permission") {
            Self::PermissionDenied { message }
        } else {
            Self::Rejected { message }
        }
    }

    pub fn is_permission(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }

    /// Actionable fix for permission failures, `None` otherwise.
    pub fn remediation(&self, project_id: &str) -> Option<String> {
        self.is_permission().then(|| {
            format!("Enable the Service Usage API: {}?project={}", SERVICE_USAGE_URL, project_id)
        })
    }
}

pub type Result<T> = std::result::Result<T, SarovarError>;

pub type BackendResult<T> = std::result::Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_classification() {
        let err = BackendError::from_message("Caller does not have required permission");
        assert!(err.is_permission());

        let err = BackendError::from_message("serviceUsage.services.use denied");
        assert!(err.is_permission());

        let err = BackendError::from_message("Collection query aborted after 5000 elements");
        assert!(!err.is_permission());
        assert!(matches!(err, BackendError::Rejected { .. }));
    }

    #[test]
    fn test_remediation_only_for_permission() {
        let denied = BackendError::PermissionDenied { message: "no".to_string() };
        let link = denied.remediation("demo-project").unwrap();
        assert!(link.contains("serviceusage.googleapis.com"));
        assert!(link.ends_with("project=demo-project"));

        let timeout = BackendError::Timeout { seconds: 120 };
        assert!(timeout.remediation("demo-project").is_none());
    }

    #[test]
    fn test_backend_error_converts() {
        let err: SarovarError = BackendError::Timeout { seconds: 3 }.into();
        assert_eq!(err.to_string(), "Compute backend timed out after 3s");
    }
}
