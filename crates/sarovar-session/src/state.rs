//! Session state and its transition function.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use sarovar_core::models::{
    Geometry, ModuleId, ParameterSet, RasterHandle, RegionTag, VisualizationSpec,
};

/// Where a session stands in the ROI and analysis lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    NoRoi,
    RoiPendingLock,
    RoiLocked,
    ParamsSelected,
    ResultReady,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::NoRoi => "no_roi",
            Phase::RoiPendingLock => "roi_pending_lock",
            Phase::RoiLocked => "roi_locked",
            Phase::ParamsSelected => "params_selected",
            Phase::ResultReady => "result_ready",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one analysis run.
///
/// A run whose module reported a failure still completes; it simply
/// carries no raster and an empty visualization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub module: ModuleId,
    pub raster: Option<RasterHandle>,
    pub vis: VisualizationSpec,
    pub completed_at: DateTime<Utc>,
}

impl AnalysisResult {
    pub fn new(module: ModuleId, raster: Option<RasterHandle>, vis: VisualizationSpec) -> Self {
        Self { module, raster, vis, completed_at: Utc::now() }
    }

    pub fn has_raster(&self) -> bool {
        self.raster.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A drawn shape waits for explicit confirmation.
    DrawingStaged(Geometry),
    /// The resolver produced a geometry.
    RoiResolved(Geometry),
    /// The resolved geometry was classified and is now fixed.
    RoiLocked(RegionTag),
    ModuleSelected(ModuleId),
    /// Parameters recomputed from the current widget snapshot.
    ParametersDerived(ParameterSet),
    /// The current widget snapshot failed validation.
    ParametersRejected,
    AnalysisCompleted(AnalysisResult),
    RoiDiscarded,
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::DrawingStaged(_) => "drawing_staged",
            SessionEvent::RoiResolved(_) => "roi_resolved",
            SessionEvent::RoiLocked(_) => "roi_locked",
            SessionEvent::ModuleSelected(_) => "module_selected",
            SessionEvent::ParametersDerived(_) => "parameters_derived",
            SessionEvent::ParametersRejected => "parameters_rejected",
            SessionEvent::AnalysisCompleted(_) => "analysis_completed",
            SessionEvent::RoiDiscarded => "roi_discarded",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Cannot apply {event} in phase {phase}")]
    InvalidInPhase { phase: Phase, event: &'static str },

    #[error("No region of interest is locked")]
    NoRoi,

    #[error("No analysis module is selected")]
    NoModule,

    #[error("Result of module {actual} does not belong to selected module {expected}")]
    ModuleMismatch { expected: ModuleId, actual: ModuleId },
}

/// Everything one user session remembers between interactions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub phase: Phase,
    pub roi: Option<Geometry>,
    /// `None` until an ROI is locked.
    pub region_tag: Option<RegionTag>,
    pub roi_locked: bool,
    /// Drawn shape awaiting confirmation; never part of the lifecycle.
    pub staged_drawing: Option<Geometry>,
    pub selected_module: Option<ModuleId>,
    pub parameters: Option<ParameterSet>,
    pub analysis_triggered: bool,
    pub last_result: Option<AnalysisResult>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the state by one event.
    pub fn apply(mut self, event: SessionEvent) -> Result<SessionState, TransitionError> {
        let name = event.name();
        match event {
            SessionEvent::DrawingStaged(geometry) => {
                if self.roi.is_some() {
                    return Err(self.invalid(name));
                }
                self.staged_drawing = Some(geometry);
            }
            SessionEvent::RoiResolved(geometry) => {
                if self.phase != Phase::NoRoi {
                    return Err(self.invalid(name));
                }
                self.roi = Some(geometry);
                self.staged_drawing = None;
            }
            SessionEvent::RoiLocked(tag) => {
                if self.phase != Phase::RoiPendingLock {
                    return Err(self.invalid(name));
                }
                self.region_tag = Some(tag);
                self.roi_locked = true;
                self.invalidate_result();
            }
            SessionEvent::ModuleSelected(module) => {
                if self.selected_module.as_ref() != Some(&module) {
                    self.selected_module = Some(module);
                    self.parameters = None;
                    self.invalidate_result();
                }
            }
            SessionEvent::ParametersDerived(parameters) => {
                if self.selected_module.is_none() {
                    return Err(TransitionError::NoModule);
                }
                self.parameters = Some(parameters);
            }
            SessionEvent::ParametersRejected => {
                self.parameters = None;
                self.invalidate_result();
            }
            SessionEvent::AnalysisCompleted(result) => {
                if !self.roi_locked {
                    return Err(TransitionError::NoRoi);
                }
                let expected = self.selected_module.clone().ok_or(TransitionError::NoModule)?;
                if expected != result.module {
                    return Err(TransitionError::ModuleMismatch { expected, actual: result.module });
                }
                self.last_result = Some(result);
                self.analysis_triggered = true;
            }
            SessionEvent::RoiDiscarded => {
                self.roi = None;
                self.region_tag = None;
                self.roi_locked = false;
                self.staged_drawing = None;
                self.invalidate_result();
            }
        }

        self.phase = self.settled_phase();
        Ok(self)
    }

    fn invalid(&self, event: &'static str) -> TransitionError {
        TransitionError::InvalidInPhase { phase: self.phase, event }
    }

    fn invalidate_result(&mut self) {
        self.last_result = None;
        self.analysis_triggered = false;
    }

    fn settled_phase(&self) -> Phase {
        match (&self.roi, self.roi_locked) {
            (None, _) => Phase::NoRoi,
            (Some(_), false) => Phase::RoiPendingLock,
            (Some(_), true) if self.last_result.is_some() => Phase::ResultReady,
            (Some(_), true) if self.parameters.is_some() => Phase::ParamsSelected,
            (Some(_), true) => Phase::RoiLocked,
        }
    }

    pub fn has_roi(&self) -> bool {
        self.roi.is_some() && self.roi_locked
    }

    /// Label of the locked region, if any.
    pub fn region_label(&self) -> Option<&str> {
        self.region_tag.as_ref().map(RegionTag::label)
    }
}
