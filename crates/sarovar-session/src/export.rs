//! Hand-off of analysis results to storage and to static map rendering.
//!
//! Both adapters only build requests: the export job is started on the
//! backend and never polled, and the static map is described by a
//! [`StaticMapRequest`] the UI layer rasterizes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use sarovar_analysis::ModuleDescriptor;
use sarovar_core::config::LayeredConfig;
use sarovar_core::error::{Result, SarovarError};
use sarovar_core::models::{
    Bounds, CollectionQuery, DateRange, Geometry, ImageExpr, PropertyFilter, RasterHandle,
    Reducer, VisualizationSpec,
};
use sarovar_core::ports::{ComputeBackend, ExportRequest, ExportTicket, ThumbnailRequest};

pub const EXPORT_PREFIX: &str = "GeoSarovar";

const BACKGROUND_DATASET: &str = "COPERNICUS/S2_SR_HARMONIZED";
const BACKGROUND_MAX_CLOUD: f64 = 20.0;
const THUMBNAIL_DIMENSIONS: u32 = 1000;
const FIGURE_WIDTH_IN: f64 = 12.0;
const FIGURE_HEIGHT_RANGE_IN: (f64, f64) = (4.0, 20.0);

/// Where exported rasters land.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSettings {
    pub folder: String,
    pub scale_m: f64,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self { folder: "GeoSarovar_Exports".to_string(), scale_m: 30.0 }
    }
}

impl ExportSettings {
    pub fn from_config(config: &LayeredConfig) -> Self {
        Self { folder: config.export_folder.value.clone(), scale_m: config.export_scale_m.value }
    }
}

/// Export job name, e.g. `GeoSarovar_Flood_20240115`.
pub fn export_description(short_name: &str, date: NaiveDate) -> String {
    format!("{}_{}_{}", EXPORT_PREFIX, short_name, date.format("%Y%m%d"))
}

/// Start an export of the result raster over the ROI.
pub fn export_to_storage(
    backend: &dyn ComputeBackend,
    result: Option<&RasterHandle>,
    roi: &Geometry,
    module: &ModuleDescriptor,
    date: NaiveDate,
    settings: &ExportSettings,
) -> Result<ExportTicket> {
    let raster = result.ok_or_else(|| SarovarError::empty_result("an analysis result to export"))?;

    let request = ExportRequest {
        image: raster.expr.clone(),
        description: export_description(module.short_name, date),
        folder: settings.folder.clone(),
        scale_m: settings.scale_m,
        region: roi.clone(),
    };
    let ticket = backend.start_export(&request)?;
    tracing::info!(
        module = %module.id,
        description = %ticket.description,
        folder = %settings.folder,
        "Export started"
    );
    Ok(ticket)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Legend {
    /// One swatch per class.
    Categorical { entries: Vec<LegendEntry> },
    /// Colorbar across the value range.
    Continuous { label: String, min: f64, max: f64, palette: Vec<String> },
    None,
}

impl Legend {
    pub fn for_vis(vis: &VisualizationSpec) -> Self {
        match (&vis.class_names, vis.min) {
            (Some(names), _) if !vis.palette.is_empty() => Legend::Categorical {
                entries: names
                    .iter()
                    .zip(&vis.palette)
                    .map(|(label, color)| LegendEntry { label: label.clone(), color: color.clone() })
                    .collect(),
            },
            (_, Some(min)) if !vis.palette.is_empty() => Legend::Continuous {
                label: "Index Value".to_string(),
                min,
                max: vis.max.unwrap_or(min),
                palette: vis.palette.clone(),
            },
            _ => Legend::None,
        }
    }
}

/// Everything needed to draw a printable map of a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticMapRequest {
    pub title: String,
    pub image_url: String,
    /// Geographic extent the image is stretched over.
    pub extent: Bounds,
    pub figure_width_in: f64,
    pub figure_height_in: f64,
    pub legend: Legend,
}

/// Figure size in inches keeping the ROI's ground aspect ratio.
///
/// Longitude spans are shortened by the cosine of the mid latitude; the
/// width is fixed and the height clamped.
pub fn figure_size(bounds: &Bounds) -> (f64, f64) {
    let height_deg = if bounds.height() == 0.0 { 0.001 } else { bounds.height() };
    let mid_lat = (bounds.min_lat + bounds.max_lat) / 2.0;
    let aspect = bounds.width() * mid_lat.to_radians().cos() / height_deg;

    let (low, high) = FIGURE_HEIGHT_RANGE_IN;
    let height = FIGURE_WIDTH_IN / aspect;
    // NaN and infinite heights come from zero-width extents
    let height = if height.is_nan() { high } else { height.clamp(low, high) };
    (FIGURE_WIDTH_IN, height)
}

/// Cloud-filtered true-colour composite for the map background.
pub fn true_colour_background(roi: &Geometry) -> ImageExpr {
    let year = DateRange::new(
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
        NaiveDate::from_ymd_opt(2023, 12, 31).unwrap_or_default(),
    );
    CollectionQuery::new(BACKGROUND_DATASET)
        .within(roi)
        .dates(year)
        .filter(PropertyFilter::less_than("CLOUDY_PIXEL_PERCENTAGE", BACKGROUND_MAX_CLOUD))
        .reduce(Reducer::Median)
        .visualize_bands(["B4", "B3", "B2"], VisualizationSpec::ranged(0.0, 3000.0, Vec::<String>::new()))
}

/// Build the static map of a result over a true-colour background.
pub fn prepare_static_map(
    backend: &dyn ComputeBackend,
    result: Option<&RasterHandle>,
    vis: &VisualizationSpec,
    roi: &Geometry,
    title: &str,
) -> Result<StaticMapRequest> {
    let raster = result.ok_or_else(|| SarovarError::empty_result("an analysis result to render"))?;
    let extent = roi.bounds().ok_or_else(|| SarovarError::InvalidGeometry {
        reason: "region of interest has no extent".to_string(),
    })?;

    let overlay = if vis.palette.is_empty() && vis.min.is_none() {
        raster.expr.clone()
    } else {
        raster.expr.clone().visualize(vis.clone())
    };
    let request = ThumbnailRequest {
        image: true_colour_background(roi).blend(overlay),
        region: roi.clone(),
        dimensions: THUMBNAIL_DIMENSIONS,
        format: "png".to_string(),
        crs: "EPSG:4326".to_string(),
    };
    let image_url = backend.thumbnail_url(&request)?;
    tracing::debug!(%image_url, "Static map thumbnail ready");

    let (figure_width_in, figure_height_in) = figure_size(&extent);
    Ok(StaticMapRequest {
        title: title.to_string(),
        image_url,
        extent,
        figure_width_in,
        figure_height_in,
        legend: Legend::for_vis(vis),
    })
}
