use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::BackendResult;
use crate::models::{Bounds, CollectionQuery, CollectionSource, Geometry, ImageExpr, Reducer};

/// Zonal statistic over a region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReduceRequest {
    pub image: ImageExpr,
    pub reducer: Reducer,
    pub region: Geometry,
    pub scale_m: f64,
    #[serde(default)]
    pub best_effort: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pixels: Option<f64>,
}

impl ReduceRequest {
    pub fn new(image: ImageExpr, reducer: Reducer, region: &Geometry, scale_m: f64) -> Self {
        Self { image, reducer, region: region.clone(), scale_m, best_effort: false, max_pixels: None }
    }

    pub fn best_effort(mut self) -> Self {
        self.best_effort = true;
        self
    }

    pub fn max_pixels(mut self, max_pixels: f64) -> Self {
        self.max_pixels = Some(max_pixels);
        self
    }
}

/// Named statistics returned by a region reduction.
///
/// Keys follow the backend's naming (`<band>` or `<band>_min`/`<band>_max`
/// for min/max reductions). Missing keys mean the region had no valid
/// pixels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReduceOutput(pub BTreeMap<String, f64>);

impl ReduceOutput {
    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    pub fn get_or(&self, key: &str, fallback: f64) -> f64 {
        self.get(key).unwrap_or(fallback)
    }

    /// First value regardless of key, for single-band reductions.
    pub fn first(&self) -> Option<f64> {
        self.0.values().next().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for ReduceOutput {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Per-image reduction over a collection, one value per acquisition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRequest {
    pub collection: CollectionQuery,
    pub band: String,
    pub reducer: Reducer,
    pub region: Geometry,
    pub scale_m: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pixels: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Lookup of the first vector feature containing a point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureQuery {
    pub collection: String,
    /// `[lon, lat]`
    pub contains: [f64; 2],
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl FeatureRecord {
    pub fn property_str(&self, name: &str) -> Option<&str> {
        self.properties.get(name).and_then(serde_json::Value::as_str)
    }
}

/// Where the map should look for a given ROI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionView {
    pub center: [f64; 2],
    pub bounds: Bounds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThumbnailRequest {
    pub image: ImageExpr,
    pub region: Geometry,
    pub dimensions: u32,
    pub format: String,
    pub crs: String,
}

/// Animated thumbnail of a sequence of already visualized frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRequest {
    pub frames: CollectionSource,
    pub region: Geometry,
    pub dimensions: u32,
    pub frames_per_second: u32,
    pub crs: String,
}

/// Raster export to the backend's storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRequest {
    pub image: ImageExpr,
    pub description: String,
    pub folder: String,
    pub scale_m: f64,
    pub region: Geometry,
}

/// Receipt for a started export job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportTicket {
    pub task_id: String,
    pub description: String,
}

/// Port for the remote geospatial computation service.
///
/// Every call blocks until the backend answers or fails. Implementations
/// must not retry; the session reports failures and lets the user
/// re-trigger.
pub trait ComputeBackend: Send + Sync {
    /// Number of collection members matching the query filters
    fn collection_size(&self, query: &CollectionQuery) -> BackendResult<usize>;

    /// Acquisition date of the first matching member
    fn first_acquisition(&self, query: &CollectionQuery) -> BackendResult<Option<NaiveDate>>;

    /// Zonal statistics of an image over a region
    fn reduce_region(&self, request: &ReduceRequest) -> BackendResult<ReduceOutput>;

    /// Per-acquisition statistics over a region
    fn time_series(&self, request: &SeriesRequest) -> BackendResult<Vec<SeriesPoint>>;

    /// First feature of a vector collection containing a point
    fn first_feature(&self, query: &FeatureQuery) -> BackendResult<Option<FeatureRecord>>;

    /// Map view for an ROI
    fn locate(&self, roi: &Geometry) -> BackendResult<RegionView>;

    /// Static thumbnail URL of a visualized image
    fn thumbnail_url(&self, request: &ThumbnailRequest) -> BackendResult<String>;

    /// Animated thumbnail URL of a frame sequence
    fn video_thumbnail_url(&self, request: &VideoRequest) -> BackendResult<String>;

    /// Start an asynchronous export; completion is not tracked
    fn start_export(&self, request: &ExportRequest) -> BackendResult<ExportTicket>;
}
