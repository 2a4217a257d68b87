//! In-memory compute backend for development, demos and tests.
//!
//! Collection metadata (scene counts, acquisition dates, boundary lookups)
//! is evaluated for real against the loaded scenes and features. Pixel
//! statistics cannot be computed locally, so region reductions and time
//! series return scripted values.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;
use geo::{Contains, LineString, Point, Polygon};

use sarovar_core::error::{BackendError, BackendResult, Result};
use sarovar_core::models::{CollectionQuery, Geometry};
use sarovar_core::ports::{
    ComputeBackend, ExportRequest, ExportTicket, FeatureQuery, FeatureRecord, ReduceOutput,
    ReduceRequest, RegionView, SeriesPoint, SeriesRequest, ThumbnailRequest, VideoRequest,
};

use crate::fixture::{Fixture, Scene};

const DEMO_FIXTURE: &str = include_str!("../fixtures/demo.toml");

#[derive(Debug, Clone)]
struct StoredFeature {
    collection: String,
    polygon: Polygon<f64>,
    record: FeatureRecord,
}

#[derive(Debug, Default)]
struct State {
    scenes: Vec<Scene>,
    features: Vec<StoredFeature>,
    reductions: BTreeMap<String, ReduceOutput>,
    series: BTreeMap<String, Vec<SeriesPoint>>,
    faults: BTreeMap<String, BackendError>,
    calls: BTreeMap<String, usize>,
    reduce_log: Vec<ReduceRequest>,
    thumbnails: Vec<ThumbnailRequest>,
    videos: Vec<VideoRequest>,
    exports: Vec<ExportRequest>,
}

impl State {
    fn matching<'a>(&'a self, query: &'a CollectionQuery) -> impl Iterator<Item = &'a Scene> + 'a {
        let region = query.region.as_ref().and_then(Geometry::bounds);
        self.scenes.iter().filter(move |scene| {
            scene.dataset == query.dataset
                && query.dates.map_or(true, |range| range.contains(scene.date))
                && query.filters.iter().all(|f| f.matches(scene.properties.get(f.property())))
                && match (&region, &scene.footprint) {
                    (Some(r), Some(f)) => {
                        r.min_lon <= f.max_lon
                            && f.min_lon <= r.max_lon
                            && r.min_lat <= f.max_lat
                            && f.min_lat <= r.max_lat
                    }
                    _ => true,
                }
        })
    }
}

/// Compute backend that keeps everything in process memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend loaded with the bundled demo catalogue.
    pub fn demo() -> Result<Self> {
        Self::from_fixture(Fixture::from_toml_str(DEMO_FIXTURE)?)
    }

    pub fn from_fixture_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_fixture(Fixture::from_file(path)?)
    }

    pub fn from_fixture(fixture: Fixture) -> Result<Self> {
        let backend = Self::new();
        for feature in fixture.features {
            backend.add_feature(&feature.collection, &feature.ring, feature.properties)?;
        }
        {
            let mut state = backend.lock();
            state.scenes = fixture.scenes;
            state.reductions = fixture.reductions;
            state.series = fixture.series;
        }
        Ok(backend)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count the call and fail it if a fault is armed for `operation`.
    fn enter(&self, operation: &str) -> BackendResult<MutexGuard<'_, State>> {
        let mut state = self.lock();
        *state.calls.entry(operation.to_string()).or_default() += 1;
        match state.faults.get(operation) {
            Some(error) => {
                tracing::debug!(operation, error = %error, "Injected backend fault");
                Err(error.clone())
            }
            None => Ok(state),
        }
    }

    pub fn add_scene(&self, scene: Scene) {
        self.lock().scenes.push(scene);
    }

    pub fn add_scenes(&self, scenes: impl IntoIterator<Item = Scene>) {
        self.lock().scenes.extend(scenes);
    }

    /// Register a boundary polygon with its attributes.
    pub fn add_feature(
        &self,
        collection: &str,
        ring: &[[f64; 2]],
        properties: serde_json::Map<String, serde_json::Value>,
    ) -> Result<()> {
        let geometry = Geometry::polygon(ring.to_vec())?;
        let exterior: LineString<f64> =
            geometry.exterior().iter().map(|c| (c[0], c[1])).collect::<Vec<_>>().into();
        self.lock().features.push(StoredFeature {
            collection: collection.to_string(),
            polygon: Polygon::new(exterior, Vec::new()),
            record: FeatureRecord { id: None, properties },
        });
        Ok(())
    }

    /// Answer reductions with `reducer` (and optionally output band) by `output`.
    ///
    /// Keys are `<reducer>` or `<reducer>:<band>`, e.g. `mean:suitability`.
    pub fn script_reduction(&self, key: impl Into<String>, output: ReduceOutput) {
        self.lock().reductions.insert(key.into(), output);
    }

    pub fn script_series(&self, dataset: impl Into<String>, points: Vec<SeriesPoint>) {
        self.lock().series.insert(dataset.into(), points);
    }

    /// Make every call to `operation` fail with `error` until cleared.
    pub fn fail_on(&self, operation: impl Into<String>, error: BackendError) {
        self.lock().faults.insert(operation.into(), error);
    }

    pub fn clear_faults(&self) {
        self.lock().faults.clear();
    }

    /// Number of calls made to `operation`, failed ones included.
    pub fn calls(&self, operation: &str) -> usize {
        self.lock().calls.get(operation).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.lock().calls.values().sum()
    }

    pub fn reduce_requests(&self) -> Vec<ReduceRequest> {
        self.lock().reduce_log.clone()
    }

    pub fn thumbnail_requests(&self) -> Vec<ThumbnailRequest> {
        self.lock().thumbnails.clone()
    }

    pub fn video_requests(&self) -> Vec<VideoRequest> {
        self.lock().videos.clone()
    }

    pub fn exports(&self) -> Vec<ExportRequest> {
        self.lock().exports.clone()
    }
}

impl ComputeBackend for MemoryBackend {
    fn collection_size(&self, query: &CollectionQuery) -> BackendResult<usize> {
        let state = self.enter("collection_size")?;
        let size = state.matching(query).count();
        tracing::debug!(dataset = %query.dataset, size, "Collection size");
        Ok(size)
    }

    fn first_acquisition(&self, query: &CollectionQuery) -> BackendResult<Option<NaiveDate>> {
        let state = self.enter("first_acquisition")?;
        Ok(state.matching(query).map(|s| s.date).min())
    }

    fn reduce_region(&self, request: &ReduceRequest) -> BackendResult<ReduceOutput> {
        let mut state = self.enter("reduce_region")?;
        state.reduce_log.push(request.clone());

        let reducer = request.reducer.as_str();
        let banded = request.image.output_band().map(|band| format!("{}:{}", reducer, band));
        let output = banded
            .and_then(|key| state.reductions.get(&key))
            .or_else(|| state.reductions.get(reducer))
            .cloned()
            .unwrap_or_default();
        Ok(output)
    }

    fn time_series(&self, request: &SeriesRequest) -> BackendResult<Vec<SeriesPoint>> {
        let state = self.enter("time_series")?;
        let points = state.series.get(&request.collection.dataset).cloned().unwrap_or_default();
        Ok(match request.collection.dates {
            Some(range) => points.into_iter().filter(|p| range.contains(p.date)).collect(),
            None => points,
        })
    }

    fn first_feature(&self, query: &FeatureQuery) -> BackendResult<Option<FeatureRecord>> {
        let state = self.enter("first_feature")?;
        let point = Point::new(query.contains[0], query.contains[1]);
        Ok(state
            .features
            .iter()
            .find(|f| f.collection == query.collection && f.polygon.contains(&point))
            .map(|f| f.record.clone()))
    }

    fn locate(&self, roi: &Geometry) -> BackendResult<RegionView> {
        let _state = self.enter("locate")?;
        let bounds = roi
            .bounds()
            .ok_or_else(|| BackendError::Rejected { message: "Geometry has no extent".to_string() })?;
        Ok(RegionView { center: bounds.center(), bounds })
    }

    fn thumbnail_url(&self, request: &ThumbnailRequest) -> BackendResult<String> {
        let mut state = self.enter("thumbnail_url")?;
        state.thumbnails.push(request.clone());
        Ok(format!("memory://thumbnails/{}.{}", uuid::Uuid::new_v4(), request.format))
    }

    fn video_thumbnail_url(&self, request: &VideoRequest) -> BackendResult<String> {
        let mut state = self.enter("video_thumbnail_url")?;
        state.videos.push(request.clone());
        Ok(format!("memory://videos/{}.gif", uuid::Uuid::new_v4()))
    }

    fn start_export(&self, request: &ExportRequest) -> BackendResult<ExportTicket> {
        let mut state = self.enter("start_export")?;
        state.exports.push(request.clone());
        let ticket = ExportTicket {
            task_id: uuid::Uuid::new_v4().to_string(),
            description: request.description.clone(),
        };
        tracing::info!(task = %ticket.task_id, description = %ticket.description, "Export started");
        Ok(ticket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sarovar_core::models::{Bounds, DateRange, ImageExpr, PropertyFilter, Reducer};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn roi() -> Geometry {
        Geometry::polygon(vec![[72.0, 26.0], [74.0, 26.0], [74.0, 28.0], [72.0, 28.0]]).unwrap()
    }

    #[test]
    fn test_collection_filters_are_evaluated() {
        let backend = MemoryBackend::new();
        backend.add_scenes([
            Scene::new("S1", date(2023, 4, 10)).with("orbitProperties_pass", "ASCENDING"),
            Scene::new("S1", date(2023, 5, 2)).with("orbitProperties_pass", "DESCENDING"),
            Scene::new("S1", date(2023, 9, 1)).with("orbitProperties_pass", "ASCENDING"),
            Scene::new("S2", date(2023, 4, 11)),
        ]);

        let spring = CollectionQuery::new("S1").dates(DateRange::new(date(2023, 4, 1), date(2023, 6, 1)));
        assert_eq!(backend.collection_size(&spring).unwrap(), 2);
        assert_eq!(backend.first_acquisition(&spring).unwrap(), Some(date(2023, 4, 10)));

        let ascending = spring.filter(PropertyFilter::equals("orbitProperties_pass", "ASCENDING"));
        assert_eq!(backend.collection_size(&ascending).unwrap(), 1);

        let inverted = CollectionQuery::new("S1").dates(DateRange::new(date(2023, 6, 1), date(2023, 4, 1)));
        assert_eq!(backend.collection_size(&inverted).unwrap(), 0);
        assert_eq!(backend.first_acquisition(&inverted).unwrap(), None);
        assert_eq!(backend.calls("collection_size"), 3);
    }

    #[test]
    fn test_footprints_limit_region_matches() {
        let backend = MemoryBackend::new();
        backend.add_scene(
            Scene::new("S1", date(2023, 4, 10)).covering(Bounds::new(80.0, 10.0, 81.0, 11.0)),
        );
        backend.add_scene(Scene::new("S1", date(2023, 4, 11)));

        let query = CollectionQuery::new("S1").within(&roi());
        assert_eq!(backend.collection_size(&query).unwrap(), 1);
    }

    #[test]
    fn test_scripted_reductions_prefer_band_key() {
        let backend = MemoryBackend::new();
        backend.script_reduction("mean", [("value", 1.0)].into_iter().collect());
        backend.script_reduction("mean:suitability", [("suitability", 0.5)].into_iter().collect());

        let suitability = ImageExpr::asset("x").rename("suitability");
        let out = backend
            .reduce_region(&ReduceRequest::new(suitability, Reducer::Mean, &roi(), 1000.0))
            .unwrap();
        assert_eq!(out.get("suitability"), Some(0.5));

        let other = ImageExpr::asset("y").rename("other");
        let out = backend.reduce_region(&ReduceRequest::new(other, Reducer::Mean, &roi(), 1000.0)).unwrap();
        assert_eq!(out.get("value"), Some(1.0));

        let out = backend
            .reduce_region(&ReduceRequest::new(ImageExpr::asset("z"), Reducer::Sum, &roi(), 10.0))
            .unwrap();
        assert!(out.is_empty());
        assert_eq!(backend.reduce_requests().len(), 3);
    }

    #[test]
    fn test_feature_lookup_uses_containment() {
        let backend = MemoryBackend::new();
        let mut properties = serde_json::Map::new();
        properties.insert("ADM1_NAME".to_string(), serde_json::json!("Rajasthan"));
        backend
            .add_feature("GAUL", &[[69.5, 23.0], [78.3, 23.0], [78.3, 30.2], [69.5, 30.2]], properties)
            .unwrap();

        let inside = FeatureQuery { collection: "GAUL".to_string(), contains: [73.0, 27.0] };
        let found = backend.first_feature(&inside).unwrap().unwrap();
        assert_eq!(found.property_str("ADM1_NAME"), Some("Rajasthan"));

        let outside = FeatureQuery { collection: "GAUL".to_string(), contains: [90.0, 27.0] };
        assert!(backend.first_feature(&outside).unwrap().is_none());

        let other = FeatureQuery { collection: "OTHER".to_string(), contains: [73.0, 27.0] };
        assert!(backend.first_feature(&other).unwrap().is_none());
    }

    #[test]
    fn test_faults_are_injected_and_counted() {
        let backend = MemoryBackend::new();
        backend.fail_on("locate", BackendError::from_message("serviceUsage API disabled"));

        let err = backend.locate(&roi()).unwrap_err();
        assert!(err.is_permission());
        assert_eq!(backend.calls("locate"), 1);

        backend.clear_faults();
        let view = backend.locate(&roi()).unwrap();
        assert_eq!(view.center, [73.0, 27.0]);
    }

    #[test]
    fn test_exports_are_recorded() {
        let backend = MemoryBackend::new();
        let request = ExportRequest {
            image: ImageExpr::constant(1.0),
            description: "GeoSarovar_Flood_20240101".to_string(),
            folder: "GeoSarovar_Exports".to_string(),
            scale_m: 30.0,
            region: roi(),
        };
        let ticket = backend.start_export(&request).unwrap();
        assert_eq!(ticket.description, "GeoSarovar_Flood_20240101");
        assert!(!ticket.task_id.is_empty());
        assert_eq!(backend.exports(), vec![request]);
    }

    #[test]
    fn test_demo_fixture_loads() {
        let backend = MemoryBackend::demo().unwrap();
        let query = FeatureQuery {
            collection: "FAO/GAUL/2015/level1".to_string(),
            contains: [73.0, 27.0],
        };
        let region = backend.first_feature(&query).unwrap().unwrap();
        assert_eq!(region.property_str("ADM1_NAME"), Some("Rajasthan"));
        assert!(backend.collection_size(&CollectionQuery::new("COPERNICUS/S1_GRD")).unwrap() > 0);
    }
}
