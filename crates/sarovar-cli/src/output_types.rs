use serde::Serialize;

use sarovar_analysis::{ModuleDescriptor, ParameterSchema};
use sarovar_core::models::{Bounds, Geometry, RegionTag};
use sarovar_core::ports::{ExportTicket, RecordingMap, RecordingPanel};
use sarovar_session::{AnalysisResult, StaticMapRequest};

/// Output for modules command
#[derive(Debug, Serialize)]
pub struct ModulesOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub modules: Vec<ModuleInfo>,
}

#[derive(Debug, Serialize)]
pub struct ModuleInfo {
    #[serde(flatten)]
    pub descriptor: ModuleDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<ParameterSchema>,
}

/// Output for resolve command
#[derive(Debug, Serialize)]
pub struct ResolveOutput {
    pub mode: String,
    pub region: RegionTag,
    pub label: String,
    pub vertex_count: usize,
    pub bounds: Option<Bounds>,
    pub geometry: Geometry,
}

/// Output for run command
#[derive(Debug, Serialize)]
pub struct RunOutput {
    pub module: String,
    pub region: String,
    pub result: AnalysisResult,
    pub map: RecordingMap,
    pub panel: RecordingPanel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export: Option<ExportTicket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub static_map: Option<StaticMapRequest>,
}

/// Output for config command
#[derive(Debug, Serialize)]
pub struct ConfigOutput {
    pub entries: Vec<ConfigEntry>,
}

#[derive(Debug, Serialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
    pub source: String,
}

/// Output for doctor command
#[derive(Debug, Serialize)]
pub struct DoctorOutput {
    pub backend: String,
    pub checks: Vec<CheckResult>,
    pub passed: usize,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}
