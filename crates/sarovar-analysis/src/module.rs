//! The contract every analysis module fulfils.

use serde::Serialize;

use sarovar_core::models::{Geometry, ModuleId, ParameterSet, RasterHandle, VisualizationSpec};
use sarovar_core::ports::{ComputeBackend, MapContext, ResultPanel};

use crate::error::{AnalysisError, Result};
use crate::schema::{ParameterSchema, SchemaContext};

/// Static identity of a module, as listed in the selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleDescriptor {
    pub id: ModuleId,
    pub name: &'static str,
    /// Used in export descriptions.
    pub short_name: &'static str,
    pub description: &'static str,
}

/// Everything a module may touch while it runs.
pub struct ModuleContext<'a> {
    pub backend: &'a dyn ComputeBackend,
    pub map: &'a mut dyn MapContext,
    pub panel: &'a mut dyn ResultPanel,
    /// Project the backend bills against, quoted in remediation hints.
    pub project_id: &'a str,
}

impl<'a> ModuleContext<'a> {
    pub fn new(
        backend: &'a dyn ComputeBackend,
        map: &'a mut dyn MapContext,
        panel: &'a mut dyn ResultPanel,
        project_id: &'a str,
    ) -> Self {
        Self { backend, map, panel, project_id }
    }
}

/// Primary raster of a successful analysis and how to draw it.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutput {
    pub raster: RasterHandle,
    pub vis: VisualizationSpec,
}

impl AnalysisOutput {
    pub fn new(raster: RasterHandle, vis: VisualizationSpec) -> Self {
        Self { raster, vis }
    }
}

pub trait AnalysisModule: Send + Sync {
    fn descriptor(&self) -> ModuleDescriptor;

    /// Widgets for this module, possibly tuned to the ROI's region.
    fn schema(&self, ctx: &SchemaContext) -> ParameterSchema;

    /// Build the request graph, draw layers and fill the panel.
    fn analyze(
        &self,
        ctx: &mut ModuleContext<'_>,
        roi: &Geometry,
        params: &ParameterSet,
    ) -> Result<AnalysisOutput>;

    /// Run the analysis without letting failures escape.
    ///
    /// Errors are reported on the result panel and yield no raster.
    fn render(
        &self,
        ctx: &mut ModuleContext<'_>,
        roi: &Geometry,
        params: &ParameterSet,
    ) -> (Option<RasterHandle>, VisualizationSpec) {
        let descriptor = self.descriptor();
        ctx.panel.heading(&format!("{} Results", descriptor.name));

        match self.analyze(ctx, roi, params) {
            Ok(output) => {
                tracing::info!(module = %descriptor.id, raster = %output.raster.label, "Analysis finished");
                (Some(output.raster), output.vis)
            }
            Err(e) => {
                tracing::warn!(module = %descriptor.id, error = %e, "Analysis failed");
                report_failure(ctx, &e);
                (None, VisualizationSpec::empty())
            }
        }
    }
}

fn report_failure(ctx: &mut ModuleContext<'_>, error: &AnalysisError) {
    if error.is_empty_result() {
        ctx.panel.warning(&error.to_string());
        return;
    }
    ctx.panel.error(&format!("Analysis failed: {}", error));
    if let Some(hint) = error.backend_error().and_then(|e| e.remediation(ctx.project_id)) {
        ctx.panel.info(&hint);
    }
}
