use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use sarovar_analysis::{
    AnalysisModule, ModuleContext, ModuleDescriptor, ModuleRegistry, ParameterSchema, SchemaContext,
};
use sarovar_core::config::LayeredConfig;
use sarovar_core::models::{Geometry, ModuleId, ParameterSet, RawParameters, RegionTag};
use sarovar_core::ports::{ComputeBackend, ExportTicket, MapContext, ResultPanel};
use sarovar_geo::{resolve, RegionClassifier, ResolveOptions, RoiInput};

use crate::error::{Result, SessionError};
use crate::export::{self, ExportSettings, StaticMapRequest};
use crate::state::{AnalysisResult, Phase, SessionEvent, SessionState};

/// Per-session tunables, usually taken from the layered configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    pub resolve: ResolveOptions,
    /// Project quoted in permission remediation links.
    pub project_id: String,
    pub region_collection: String,
    pub region_name_property: String,
    pub export: ExportSettings,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from_config(&LayeredConfig::with_defaults())
    }
}

impl SessionOptions {
    pub fn from_config(config: &LayeredConfig) -> Self {
        Self {
            resolve: ResolveOptions { simplify_tolerance_m: config.simplify_tolerance_m.value },
            project_id: config.project_id.value.clone(),
            region_collection: config.region_collection.value.clone(),
            region_name_property: config.region_name_property.value.clone(),
            export: ExportSettings::from_config(config),
        }
    }
}

/// Widget values captured by the UI for one interaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSnapshot {
    pub module: ModuleId,
    #[serde(default)]
    pub parameters: RawParameters,
    /// Whether the run button was pressed.
    #[serde(default)]
    pub run: bool,
}

impl InputSnapshot {
    pub fn new(module: ModuleId, parameters: RawParameters) -> Self {
        Self { module, parameters, run: false }
    }

    pub fn run(mut self) -> Self {
        self.run = true;
        self
    }
}

/// Drives one user session through the ROI and analysis lifecycle
pub struct Orchestrator {
    state: SessionState,
    backend: Arc<dyn ComputeBackend>,
    registry: Arc<ModuleRegistry>,
    classifier: RegionClassifier,
    options: SessionOptions,
    /// Fixed "today" for date-dependent defaults; the local date otherwise.
    today: Option<NaiveDate>,
}

impl Orchestrator {
    /// Create a new orchestrator with an empty session
    pub fn new(
        backend: Arc<dyn ComputeBackend>,
        registry: Arc<ModuleRegistry>,
        options: SessionOptions,
    ) -> Self {
        let classifier =
            RegionClassifier::new(options.region_collection.clone(), options.region_name_property.clone());
        Self { state: SessionState::new(), backend, registry, classifier, options, today: None }
    }

    /// Pin the date used for date-dependent parameter defaults.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    fn advance(&mut self, event: SessionEvent) -> Result<()> {
        let name = event.name();
        let next = self.state.clone().apply(event)?;
        if next.phase != self.state.phase {
            tracing::info!(event = name, from = %self.state.phase, to = %next.phase, "Session transition");
        }
        self.state = next;
        Ok(())
    }

    /// Resolve an ROI input, classify it once and lock it.
    ///
    /// A resolver failure leaves the session untouched.
    pub fn submit_roi(&mut self, input: &RoiInput) -> Result<RegionTag> {
        if self.state.roi.is_some() {
            return Err(SessionError::RoiAlreadyLocked);
        }

        let geometry = resolve(input, &self.options.resolve).map_err(|e| {
            tracing::warn!(mode = input.mode_name(), error = %e, "ROI input rejected");
            e
        })?;
        self.advance(SessionEvent::RoiResolved(geometry))?;
        self.lock_roi()
    }

    /// Hold a drawn shape until the user confirms it.
    pub fn stage_drawing(&mut self, shape: serde_json::Value) -> Result<()> {
        if self.state.roi.is_some() {
            return Err(SessionError::RoiAlreadyLocked);
        }
        let geometry = resolve(&RoiInput::drawn_shape(shape), &self.options.resolve)?;
        self.advance(SessionEvent::DrawingStaged(geometry))
    }

    /// Promote the staged drawing to the session ROI.
    pub fn confirm_drawing(&mut self) -> Result<RegionTag> {
        let staged = self.state.staged_drawing.clone().ok_or(SessionError::NothingStaged)?;
        self.advance(SessionEvent::RoiResolved(staged))?;
        self.lock_roi()
    }

    fn lock_roi(&mut self) -> Result<RegionTag> {
        let roi = self.state.roi.clone().ok_or(SessionError::NoRoi)?;
        let tag = RegionTag::from_lookup(self.classifier.classify(self.backend.as_ref(), &roi));
        tracing::info!(region = %tag, vertices = roi.vertex_count(), "ROI locked");
        self.advance(SessionEvent::RoiLocked(tag.clone()))?;
        Ok(tag)
    }

    /// Forget the ROI and everything computed from it.
    pub fn discard_roi(&mut self) -> Result<()> {
        self.classifier.invalidate();
        self.advance(SessionEvent::RoiDiscarded)
    }

    pub fn select_module(&mut self, id: &ModuleId) -> Result<()> {
        if !self.registry.contains(id) {
            return Err(SessionError::UnknownModule(id.clone()));
        }
        self.advance(SessionEvent::ModuleSelected(id.clone()))
    }

    fn selected(&self) -> Result<(ModuleId, &dyn AnalysisModule)> {
        let id = self.state.selected_module.clone().ok_or(SessionError::NoModule)?;
        let module = self.registry.get(&id).ok_or_else(|| SessionError::UnknownModule(id.clone()))?;
        Ok((id, module))
    }

    pub fn schema_context(&self) -> SchemaContext {
        let region = self.state.region_tag.clone();
        match self.today {
            Some(today) => SchemaContext::new(region, today),
            None => SchemaContext::new(region, Local::now().date_naive()),
        }
    }

    /// Widgets of the selected module for the current region.
    pub fn schema(&self) -> Result<ParameterSchema> {
        let (_, module) = self.selected()?;
        Ok(module.schema(&self.schema_context()))
    }

    pub fn descriptor(&self) -> Result<ModuleDescriptor> {
        self.selected().map(|(_, module)| module.descriptor())
    }

    /// Recompute the parameters from the current widget values.
    ///
    /// Invalid values drop the previous set, so a later run cannot pick
    /// up parameters the widgets no longer show.
    pub fn derive_parameters(&mut self, raw: &RawParameters) -> Result<&ParameterSet> {
        let parameters = match self.schema()?.validate(raw) {
            Ok(parameters) => parameters,
            Err(e) => {
                tracing::warn!(error = %e, "Parameters rejected");
                self.advance(SessionEvent::ParametersRejected)?;
                return Err(e.into());
            }
        };
        tracing::debug!(count = parameters.len(), "Parameters derived");
        self.advance(SessionEvent::ParametersDerived(parameters))?;
        self.state.parameters.as_ref().ok_or(SessionError::NoModule)
    }

    /// Run the selected module on the locked ROI.
    ///
    /// Without an ROI nothing changes. A permission failure while
    /// locating the ROI halts the pass before any module work.
    pub fn run(&mut self, map: &mut dyn MapContext, panel: &mut dyn ResultPanel) -> Result<&AnalysisResult> {
        let roi = match (&self.state.roi, self.state.roi_locked) {
            (Some(roi), true) => roi.clone(),
            _ => return Err(SessionError::NoRoi),
        };
        if self.state.parameters.is_none() {
            self.derive_parameters(&RawParameters::new())?;
        }
        let parameters = self.state.parameters.clone().ok_or(SessionError::NoModule)?;
        let (id, module) = self.selected()?;

        // Phase 1: place the map over the ROI
        match self.backend.locate(&roi) {
            Ok(view) => map.center_on(&view),
            Err(e) if e.is_permission() => {
                let remediation = e.remediation(&self.options.project_id).unwrap_or_default();
                panel.error(&format!("Compute backend error: {}", e));
                panel.info(&remediation);
                tracing::warn!(error = %e, "Render pass halted on permission error");
                return Err(SessionError::PermissionDenied { message: e.to_string(), remediation });
            }
            Err(e) => tracing::warn!(error = %e, "Could not center map on ROI"),
        }

        // Phase 2: module dispatch
        tracing::info!(module = %id, region = ?self.state.region_label(), "Running analysis");
        let (raster, vis) = {
            let mut ctx = ModuleContext::new(self.backend.as_ref(), map, panel, &self.options.project_id);
            module.render(&mut ctx, &roi, &parameters)
        };

        // Phase 3: record the outcome
        self.advance(SessionEvent::AnalysisCompleted(AnalysisResult::new(id, raster, vis)))?;
        self.state.last_result.as_ref().ok_or(SessionError::NoRoi)
    }

    /// One resolve-state-render cycle driven by the current widget values.
    ///
    /// Re-runs the analysis when it was triggered earlier and is still
    /// valid, mirroring a dashboard that redraws on every interaction.
    pub fn render_pass(
        &mut self,
        snapshot: &InputSnapshot,
        map: &mut dyn MapContext,
        panel: &mut dyn ResultPanel,
    ) -> Result<Option<&AnalysisResult>> {
        self.select_module(&snapshot.module)?;
        self.derive_parameters(&snapshot.parameters)?;

        if snapshot.run || (self.state.analysis_triggered && self.state.has_roi()) {
            self.run(map, panel)?;
        }
        Ok(self.state.last_result.as_ref())
    }

    fn locked_roi(&self) -> Result<&Geometry> {
        match (&self.state.roi, self.state.roi_locked) {
            (Some(roi), true) => Ok(roi),
            _ => Err(SessionError::NoRoi),
        }
    }

    /// Start an export of the last result.
    pub fn export(&self) -> Result<ExportTicket> {
        let roi = self.locked_roi()?;
        let descriptor = self.descriptor()?;
        let raster = self.state.last_result.as_ref().and_then(|r| r.raster.as_ref());
        let today = self.schema_context().today;
        Ok(export::export_to_storage(
            self.backend.as_ref(),
            raster,
            roi,
            &descriptor,
            today,
            &self.options.export,
        )?)
    }

    /// Describe a printable map of the last result.
    ///
    /// Defaults the title to `Analysis: <module name>`.
    pub fn static_map(&self, title: Option<&str>) -> Result<StaticMapRequest> {
        let roi = self.locked_roi()?;
        let descriptor = self.descriptor()?;
        let title = title.map(str::to_string).unwrap_or_else(|| format!("Analysis: {}", descriptor.name));
        let result = self.state.last_result.as_ref();
        let raster = result.and_then(|r| r.raster.as_ref());
        let vis = result.map(|r| r.vis.clone()).unwrap_or_default();
        Ok(export::prepare_static_map(self.backend.as_ref(), raster, &vis, roi, &title)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sarovar_backend::MemoryBackend;
    use sarovar_core::error::BackendError;
    use sarovar_core::ports::{RecordingMap, RecordingPanel};

    fn orchestrator(backend: Arc<MemoryBackend>) -> Orchestrator {
        Orchestrator::new(backend, Arc::new(ModuleRegistry::standard()), SessionOptions::default())
            .with_today(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
    }

    fn point() -> RoiInput {
        RoiInput::point_buffer(26.9, 75.8, 5000.0)
    }

    #[test]
    fn test_submit_roi_locks_unclassified() {
        let backend = Arc::new(MemoryBackend::new());
        let mut session = orchestrator(backend.clone());

        let tag = session.submit_roi(&point()).unwrap();
        assert_eq!(tag, RegionTag::Unclassified);
        assert_eq!(session.phase(), Phase::RoiLocked);
        assert_eq!(backend.calls("first_feature"), 1);

        assert!(matches!(session.submit_roi(&point()), Err(SessionError::RoiAlreadyLocked)));
    }

    #[test]
    fn test_invalid_input_leaves_state() {
        let mut session = orchestrator(Arc::new(MemoryBackend::new()));
        let err = session.submit_roi(&RoiInput::point_buffer(95.0, 0.0, 10.0)).unwrap_err();
        assert!(matches!(err, SessionError::Core(_)));
        assert_eq!(session.state(), &SessionState::new());
    }

    #[test]
    fn test_drawing_requires_confirmation() {
        let mut session = orchestrator(Arc::new(MemoryBackend::new()));
        assert!(matches!(session.confirm_drawing(), Err(SessionError::NothingStaged)));

        let shape = serde_json::json!({
            "type": "Polygon",
            "coordinates": [[[72.0, 26.0], [73.0, 26.0], [73.0, 27.0], [72.0, 26.0]]]
        });
        session.stage_drawing(shape).unwrap();
        assert_eq!(session.phase(), Phase::NoRoi);

        session.confirm_drawing().unwrap();
        assert_eq!(session.phase(), Phase::RoiLocked);
        assert!(session.state().staged_drawing.is_none());
    }

    #[test]
    fn test_unknown_module() {
        let mut session = orchestrator(Arc::new(MemoryBackend::new()));
        let err = session.select_module(&ModuleId::new("ndvi")).unwrap_err();
        assert!(matches!(err, SessionError::UnknownModule(_)));
        assert!(matches!(session.schema(), Err(SessionError::NoModule)));
    }

    #[test]
    fn test_permission_error_halts_pass() {
        let backend = Arc::new(MemoryBackend::new());
        let mut session = orchestrator(backend.clone());
        session.submit_roi(&point()).unwrap();
        session.select_module(&ModuleId::FLOOD).unwrap();
        backend.fail_on("locate", BackendError::from_message("serviceUsage.services.use denied"));

        let mut map = RecordingMap::new();
        let mut panel = RecordingPanel::new();
        let err = session.run(&mut map, &mut panel).unwrap_err();

        assert!(err.remediation().unwrap().ends_with("project=your-project-id"));
        assert_eq!(session.phase(), Phase::ParamsSelected);
        assert!(!session.state().analysis_triggered);
        assert_eq!(backend.calls("collection_size"), 0);
        assert_eq!(panel.errors().len(), 1);
    }

    #[test]
    fn test_invalid_parameters_are_not_replaced_by_earlier_ones() {
        let mut session = orchestrator(Arc::new(MemoryBackend::new()));
        session.submit_roi(&point()).unwrap();
        let mut map = RecordingMap::new();
        let mut panel = RecordingPanel::new();

        let first = InputSnapshot::new(ModuleId::FLOOD, RawParameters::new().with("threshold", 1.4)).run();
        session.render_pass(&first, &mut map, &mut panel).unwrap();
        assert_eq!(session.phase(), Phase::ResultReady);

        let bad = InputSnapshot::new(ModuleId::FLOOD, RawParameters::new().with("threshold", 9.0));
        let err = session.render_pass(&bad, &mut map, &mut panel).unwrap_err();
        assert!(matches!(err, SessionError::Core(sarovar_core::SarovarError::Validation { .. })));
        assert_eq!(session.phase(), Phase::RoiLocked);
        assert!(session.state().parameters.is_none());
        assert!(session.state().last_result.is_none());

        // A bare run derives fresh defaults instead of reusing 1.4
        session.run(&mut map, &mut panel).unwrap();
        let parameters = session.state().parameters.as_ref().unwrap();
        assert_eq!(parameters.float("threshold").unwrap(), 1.25);
    }

    #[test]
    fn test_export_requires_result() {
        let backend = Arc::new(MemoryBackend::new());
        let mut session = orchestrator(backend.clone());
        assert!(matches!(session.export(), Err(SessionError::NoRoi)));

        session.submit_roi(&point()).unwrap();
        session.select_module(&ModuleId::FLOOD).unwrap();
        assert!(matches!(
            session.export(),
            Err(SessionError::Core(sarovar_core::SarovarError::EmptyResult { .. }))
        ));
    }
}
