//! The standard analysis modules and what they share.

pub mod encroachment;
pub mod flood;
pub mod rainfall;
pub mod rwh;
pub mod water_quality;

pub use encroachment::EncroachmentModule;
pub use flood::FloodModule;
pub use rainfall::RainfallModule;
pub use rwh::RainwaterHarvestingModule;
pub use water_quality::WaterQualityModule;

use chrono::NaiveDate;

use sarovar_core::error::SarovarError;
use sarovar_core::models::{
    DateRange, Geometry, ImageExpr, ParameterSet, PropertyFilter, RasterHandle, Reducer,
    VisualizationSpec,
};
use sarovar_core::ports::{ComputeBackend, MapLayer, ReduceRequest};

use crate::error::Result;
use crate::schema::ParamDef;

pub(crate) const SENTINEL1_GRD: &str = "COPERNICUS/S1_GRD";

/// Satellite pass direction filter for radar collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orbit {
    Any,
    Ascending,
    Descending,
}

impl Orbit {
    pub const CHOICES: &'static [&'static str] = &["any", "ascending", "descending"];

    pub fn parse(value: &str) -> std::result::Result<Self, SarovarError> {
        match value.to_ascii_lowercase().as_str() {
            "any" | "both" => Ok(Orbit::Any),
            "ascending" => Ok(Orbit::Ascending),
            "descending" => Ok(Orbit::Descending),
            other => Err(SarovarError::validation("orbit", format!("unknown orbit '{}'", other))),
        }
    }

    pub fn from_params(params: &ParameterSet) -> Result<Self> {
        Ok(Self::parse(params.text("orbit")?)?)
    }

    /// Value of `orbitProperties_pass` to match, `None` for both passes.
    pub fn pass(self) -> Option<&'static str> {
        match self {
            Orbit::Any => None,
            Orbit::Ascending => Some("ASCENDING"),
            Orbit::Descending => Some("DESCENDING"),
        }
    }

    pub fn filter(self) -> Option<PropertyFilter> {
        self.pass().map(|pass| PropertyFilter::equals("orbitProperties_pass", pass))
    }

    pub fn label(self) -> &'static str {
        self.pass().unwrap_or("BOTH")
    }
}

pub(crate) fn orbit_param() -> ParamDef {
    ParamDef::choice("orbit", "Orbit direction", Orbit::CHOICES, "any")
}

pub(crate) fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

/// Date range built from two date parameters.
pub(crate) fn period(params: &ParameterSet, start: &str, end: &str) -> Result<DateRange> {
    Ok(DateRange::new(params.date(start)?, params.date(end)?))
}

/// Square meters to hectares, rounded to two decimals.
pub(crate) fn hectares(square_meters: f64) -> f64 {
    (square_meters / 10_000.0 * 100.0).round() / 100.0
}

/// Map layer whose raster carries the layer name as label.
pub(crate) fn layer(name: &str, expr: ImageExpr, vis: VisualizationSpec) -> MapLayer {
    MapLayer::new(name, RasterHandle::new(name, expr), vis)
}

/// Area in hectares of the non-zero pixels of `mask` within `roi`.
pub(crate) fn masked_area_ha(
    backend: &dyn ComputeBackend,
    mask: ImageExpr,
    roi: &Geometry,
    scale_m: f64,
    tune: impl FnOnce(ReduceRequest) -> ReduceRequest,
) -> Result<f64> {
    let image = (mask * ImageExpr::pixel_area()).rename("area");
    let request = tune(ReduceRequest::new(image, Reducer::Sum, roi, scale_m));
    let stats = backend.reduce_region(&request)?;
    Ok(hectares(stats.get("area").unwrap_or(0.0)))
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_else(|| "N/A".to_string())
}
