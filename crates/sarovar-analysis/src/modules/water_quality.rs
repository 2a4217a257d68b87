//! Optical water quality indices from Sentinel-2.

use sarovar_core::error::SarovarError;
use sarovar_core::models::{
    CollectionJoin, CollectionQuery, Geometry, ImageExpr, ModuleId, ParameterSet, RasterHandle,
    Reducer, VisualizationSpec,
};
use sarovar_core::ports::{SeriesPoint, SeriesRequest};

use super::{layer, period};
use crate::error::{AnalysisError, Result};
use crate::module::{AnalysisModule, AnalysisOutput, ModuleContext, ModuleDescriptor};
use crate::schema::{ParamDef, ParameterSchema, SchemaContext};

const SURFACE_REFLECTANCE: &str = "COPERNICUS/S2_SR_HARMONIZED";
const CLOUD_PROBABILITY: &str = "COPERNICUS/S2_CLOUD_PROBABILITY";
const REFLECTANCE_SCALE: f64 = 0.0001;
const SERIES_SCALE_M: f64 = 20.0;
const LOOKBACK_DAYS: i64 = 90;

/// A water quality indicator and how it is composited and drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityIndex {
    Turbidity,
    SuspendedSolids,
    Cyanobacteria,
    Chlorophyll,
    Cdom,
}

impl QualityIndex {
    pub const CHOICES: &'static [&'static str] =
        &["turbidity", "tss", "cyanobacteria", "chlorophyll", "cdom"];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "turbidity" => Some(Self::Turbidity),
            "tss" => Some(Self::SuspendedSolids),
            "cyanobacteria" => Some(Self::Cyanobacteria),
            "chlorophyll" => Some(Self::Chlorophyll),
            "cdom" => Some(Self::Cdom),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Turbidity => "Turbidity Index (NDTI)",
            Self::SuspendedSolids => "TSS (Est. mg/L)",
            Self::Cyanobacteria => "Cyano Risk (Ratio > 1)",
            Self::Chlorophyll => "Chlorophyll-a (NDCI)",
            Self::Cdom => "CDOM Proxy (Green/Blue)",
        }
    }

    /// Index computed from a (masked) scene.
    fn expression(self, scene: ImageExpr) -> ImageExpr {
        match self {
            Self::Turbidity => scene.normalized_difference("B4", "B3"),
            Self::SuspendedSolids => scene.band("B4").pow(1.357) * 2950.0,
            Self::Cyanobacteria => scene.clone().band("B5") / scene.band("B4"),
            Self::Chlorophyll => scene.normalized_difference("B5", "B4"),
            Self::Cdom => scene.clone().band("B3") / scene.band("B2"),
        }
        .rename("value")
    }

    fn composite(self) -> Reducer {
        match self {
            Self::Turbidity | Self::Chlorophyll => Reducer::Mean,
            Self::SuspendedSolids | Self::Cdom => Reducer::Median,
            Self::Cyanobacteria => Reducer::Max,
        }
    }

    fn vis(self) -> VisualizationSpec {
        let spec = match self {
            Self::Turbidity => {
                VisualizationSpec::ranged(-0.15, 0.15, ["0000ff", "00ffff", "ffff00", "ff0000"])
            }
            Self::SuspendedSolids => VisualizationSpec::ranged(
                0.0,
                50.0,
                ["0000ff", "00ffff", "ffff00", "ff0000", "5c0000"],
            ),
            Self::Cyanobacteria => VisualizationSpec::ranged(0.8, 1.5, ["0000ff", "00ff00", "ff0000"]),
            Self::Chlorophyll => {
                VisualizationSpec::ranged(-0.1, 0.2, ["0000ff", "00ffff", "00ff00", "ff0000"])
            }
            Self::Cdom => VisualizationSpec::ranged(0.5, 2.0, ["0000ff", "yellow", "brown"]),
        };
        spec.with_label(self.label())
    }
}

/// Reflectance of a scene with cloudy and dry pixels masked out.
fn masked_reflectance(max_cloud_percent: f64) -> ImageExpr {
    let cloudy = ImageExpr::joined("cloud_mask", "probability").gt(max_cloud_percent);
    let bands = ImageExpr::current().select(["B.*"]) * REFLECTANCE_SCALE;
    let water = bands.clone().normalized_difference("B3", "B8").rename("ndwi").gt(0.0);
    bands.update_mask(!cloudy).update_mask(water)
}

/// Dated index values as a two-column CSV.
fn series_csv(points: &[SeriesPoint]) -> String {
    let mut csv = String::from("Date,Value\n");
    for point in points {
        csv.push_str(&format!("{},{}\n", point.date.format("%Y-%m-%d"), point.value));
    }
    csv
}

pub struct WaterQualityModule;

impl AnalysisModule for WaterQualityModule {
    fn descriptor(&self) -> ModuleDescriptor {
        ModuleDescriptor {
            id: ModuleId::WATER_QUALITY,
            name: "Water Quality",
            short_name: "Water",
            description: "Turbidity, suspended solids, algal and organic matter indices over open water",
        }
    }

    fn schema(&self, ctx: &SchemaContext) -> ParameterSchema {
        let start = ctx.today - chrono::Duration::days(LOOKBACK_DAYS);
        ParameterSchema::new(vec![
            ParamDef::choice("index", "Parameter", QualityIndex::CHOICES, "turbidity"),
            ParamDef::date("start", "Start date", start),
            ParamDef::date("end", "End date", ctx.today),
            ParamDef::int("max_cloud_percent", "Max cloud probability (%)", 20, 5, 50),
        ])
    }

    fn analyze(
        &self,
        ctx: &mut ModuleContext<'_>,
        roi: &Geometry,
        params: &ParameterSet,
    ) -> Result<AnalysisOutput> {
        let name = params.text("index")?;
        let index = QualityIndex::parse(name).ok_or_else(|| {
            SarovarError::validation("index", format!("unknown water quality index '{}'", name))
        })?;
        let range = period(params, "start", "end")?;
        let max_cloud = params.int("max_cloud_percent")? as f64;

        let scenes = CollectionQuery::new(SURFACE_REFLECTANCE).dates(range).within(roi);
        if ctx.backend.collection_size(&scenes)? == 0 {
            return Err(AnalysisError::empty("Sentinel-2 scenes in the selected date range"));
        }

        let indexed = scenes
            .join(CollectionJoin {
                dataset: CLOUD_PROBABILITY.to_string(),
                match_property: "system:index".to_string(),
                save_as: "cloud_mask".to_string(),
            })
            .map(index.expression(masked_reflectance(max_cloud)));

        let result = indexed.clone().reduce(index.composite()).clip(roi);
        let vis = index.vis();
        ctx.map.add_layer(layer(index.label(), result.clone(), vis.clone()));
        ctx.map.add_colorbar(&vis, index.label());

        ctx.panel.heading("Trend Analysis");
        let request = SeriesRequest {
            collection: indexed,
            band: "value".to_string(),
            reducer: Reducer::Median,
            region: roi.clone(),
            scale_m: SERIES_SCALE_M,
            max_pixels: Some(1e9),
        };
        match ctx.backend.time_series(&request) {
            Ok(mut points) if !points.is_empty() => {
                points.retain(|p| p.value.is_finite());
                points.sort_by_key(|p| p.date);
                let csv = series_csv(&points);
                ctx.panel.chart(index.label(), points);
                ctx.panel.caption(&format!("Median {} over time", index.label()));
                ctx.panel.download("Download CSV", "water_quality_ts.csv", "text/csv", csv);
            }
            Ok(_) => ctx.panel.warning("No clear water pixels found (Try reducing cloud threshold)."),
            Err(e) => {
                tracing::warn!(error = %e, "Water quality time series failed");
                ctx.panel.warning(&format!("Chart Error: {}", e));
            }
        }

        Ok(AnalysisOutput::new(RasterHandle::new(index.label(), result), vis))
    }
}
