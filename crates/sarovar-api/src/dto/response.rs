use serde::Serialize;
use uuid::Uuid;

use sarovar_analysis::{ModuleDescriptor, ParameterSchema};
use sarovar_core::models::RegionTag;
use sarovar_core::ports::{RecordingMap, RecordingPanel};
use sarovar_session::{AnalysisResult, SessionState};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self { status: "ok", service: "sarovar-api" }
    }
}

/// Module with its widgets for a region
#[derive(Debug, Serialize)]
pub struct ModuleResponse {
    #[serde(flatten)]
    pub descriptor: ModuleDescriptor,
    pub schema: ParameterSchema,
}

/// Session snapshot
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: String,
    /// Display label of the locked region, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_label: Option<String>,
    #[serde(flatten)]
    pub state: SessionState,
}

impl SessionResponse {
    pub fn new(id: Uuid, state: &SessionState) -> Self {
        Self { id: id.to_string(), region_label: state.region_label().map(str::to_string), state: state.clone() }
    }
}

/// Outcome of an ROI submission
#[derive(Debug, Serialize)]
pub struct RoiResponse {
    /// `None` while a drawing is only staged.
    pub region: Option<RegionTag>,
    pub staged: bool,
    pub session: SessionResponse,
}

#[derive(Debug, Serialize)]
pub struct ModuleSelectionResponse {
    pub module: ModuleResponse,
    pub session: SessionResponse,
}

/// Analysis run output: the result plus everything drawn along the way
#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub result: AnalysisResult,
    pub map: RecordingMap,
    pub panel: RecordingPanel,
    pub session: SessionResponse,
}

/// Delete operation response
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

impl DeleteResponse {
    pub fn success(entity: &str, id: &str) -> Self {
        Self { success: true, message: format!("Successfully deleted {} {}", entity, id) }
    }
}
