use sarovar_core::error::{BackendError, SarovarError};
use thiserror::Error;

/// Failure inside an analysis module.
///
/// Never crosses the module boundary: [`crate::AnalysisModule::render`]
/// turns it into a result-panel message.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Core(#[from] SarovarError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl AnalysisError {
    pub fn empty(what: impl Into<String>) -> Self {
        Self::Core(SarovarError::empty_result(what))
    }

    /// The backend failure behind this error, if any.
    pub fn backend_error(&self) -> Option<&BackendError> {
        match self {
            Self::Backend(e) | Self::Core(SarovarError::Backend(e)) => Some(e),
            Self::Core(_) => None,
        }
    }

    pub fn is_permission(&self) -> bool {
        self.backend_error().is_some_and(BackendError::is_permission)
    }

    pub fn is_empty_result(&self) -> bool {
        matches!(self, Self::Core(SarovarError::EmptyResult { .. }))
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
