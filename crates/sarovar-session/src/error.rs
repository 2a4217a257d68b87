use sarovar_core::error::SarovarError;
use sarovar_core::models::ModuleId;
use thiserror::Error;

use crate::state::TransitionError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No region of interest set. Upload, enter or draw an area first")]
    NoRoi,

    #[error("A region of interest is already locked. Discard it before setting a new one")]
    RoiAlreadyLocked,

    #[error("No drawn shape is waiting for confirmation")]
    NothingStaged,

    #[error("No analysis module selected")]
    NoModule,

    #[error("Unknown analysis module: {0}")]
    UnknownModule(ModuleId),

    /// The backend refused the project; the render pass stops here.
    #[error("{message}")]
    PermissionDenied { message: String, remediation: String },

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Core(#[from] SarovarError),
}

impl SessionError {
    pub fn remediation(&self) -> Option<&str> {
        match self {
            Self::PermissionDenied { remediation, .. } => Some(remediation),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
