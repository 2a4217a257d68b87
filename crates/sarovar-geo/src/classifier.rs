//! Administrative region lookup for ROI geometries.

use sarovar_core::models::Geometry;
use sarovar_core::ports::{ComputeBackend, FeatureQuery};

use crate::models::GeometryExt;

/// Looks up the administrative region containing a geometry's centroid.
///
/// The answer for the most recent geometry is memoized: asking again for
/// the identical geometry never reaches the backend. A lookup failure is
/// cached as `None` like any other answer.
#[derive(Debug, Clone)]
pub struct RegionClassifier {
    collection: String,
    name_property: String,
    cache: Option<(Geometry, Option<String>)>,
}

impl RegionClassifier {
    pub fn new(collection: impl Into<String>, name_property: impl Into<String>) -> Self {
        Self { collection: collection.into(), name_property: name_property.into(), cache: None }
    }

    /// Classifier over the FAO GAUL first-level boundaries.
    pub fn gaul_level1() -> Self {
        Self::new("FAO/GAUL/2015/level1", "ADM1_NAME")
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Name of the region containing the centroid of `geometry`, if any.
    pub fn classify(&mut self, backend: &dyn ComputeBackend, geometry: &Geometry) -> Option<String> {
        if let Some((cached, tag)) = &self.cache {
            if cached == geometry {
                tracing::debug!(region = ?tag, "Region lookup served from cache");
                return tag.clone();
            }
        }

        let tag = self.lookup(backend, geometry);
        self.cache = Some((geometry.clone(), tag.clone()));
        tag
    }

    /// Forget the memoized answer.
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    fn lookup(&self, backend: &dyn ComputeBackend, geometry: &Geometry) -> Option<String> {
        let centroid = geometry.centroid_coords()?;
        let query = FeatureQuery { collection: self.collection.clone(), contains: centroid };

        match backend.first_feature(&query) {
            Ok(Some(feature)) => {
                let name = feature.property_str(&self.name_property).map(str::to_string);
                if name.is_none() {
                    tracing::warn!(
                        property = %self.name_property,
                        "Matching region has no name attribute"
                    );
                }
                tracing::info!(region = ?name, lon = centroid[0], lat = centroid[1], "Classified ROI");
                name
            }
            Ok(None) => {
                tracing::info!(lon = centroid[0], lat = centroid[1], "ROI outside known regions");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Region lookup failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sarovar_core::error::{BackendError, BackendResult};
    use sarovar_core::models::CollectionQuery;
    use sarovar_core::ports::{
        ExportRequest, ExportTicket, FeatureRecord, ReduceOutput, ReduceRequest, RegionView,
        SeriesPoint, SeriesRequest, ThumbnailRequest, VideoRequest,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend that only answers feature lookups.
    struct LookupBackend {
        answer: BackendResult<Option<FeatureRecord>>,
        calls: AtomicUsize,
    }

    impl LookupBackend {
        fn named(name: &str) -> Self {
            let mut properties = serde_json::Map::new();
            properties.insert("ADM1_NAME".to_string(), serde_json::json!(name));
            Self { answer: Ok(Some(FeatureRecord { id: None, properties })), calls: AtomicUsize::new(0) }
        }

        fn failing() -> Self {
            Self {
                answer: Err(BackendError::Timeout { seconds: 120 }),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl ComputeBackend for LookupBackend {
        fn collection_size(&self, _: &CollectionQuery) -> BackendResult<usize> {
            unimplemented!()
        }
        fn first_acquisition(&self, _: &CollectionQuery) -> BackendResult<Option<NaiveDate>> {
            unimplemented!()
        }
        fn reduce_region(&self, _: &ReduceRequest) -> BackendResult<ReduceOutput> {
            unimplemented!()
        }
        fn time_series(&self, _: &SeriesRequest) -> BackendResult<Vec<SeriesPoint>> {
            unimplemented!()
        }
        fn first_feature(&self, _: &FeatureQuery) -> BackendResult<Option<FeatureRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.clone()
        }
        fn locate(&self, _: &Geometry) -> BackendResult<RegionView> {
            unimplemented!()
        }
        fn thumbnail_url(&self, _: &ThumbnailRequest) -> BackendResult<String> {
            unimplemented!()
        }
        fn video_thumbnail_url(&self, _: &VideoRequest) -> BackendResult<String> {
            unimplemented!()
        }
        fn start_export(&self, _: &ExportRequest) -> BackendResult<ExportTicket> {
            unimplemented!()
        }
    }

    fn square() -> Geometry {
        Geometry::polygon(vec![[72.0, 26.0], [74.0, 26.0], [74.0, 28.0], [72.0, 28.0]]).unwrap()
    }

    #[test]
    fn test_classify_is_memoized() {
        let backend = LookupBackend::named("Rajasthan");
        let mut classifier = RegionClassifier::gaul_level1();

        let first = classifier.classify(&backend, &square());
        let second = classifier.classify(&backend, &square());

        assert_eq!(first.as_deref(), Some("Rajasthan"));
        assert_eq!(first, second);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_new_geometry_replaces_cache() {
        let backend = LookupBackend::named("Rajasthan");
        let mut classifier = RegionClassifier::gaul_level1();

        classifier.classify(&backend, &square());
        classifier.classify(&backend, &Geometry::point(73.0, 27.0));
        classifier.classify(&backend, &square());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);

        classifier.invalidate();
        classifier.classify(&backend, &square());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_backend_failure_is_a_miss() {
        let backend = LookupBackend::failing();
        let mut classifier = RegionClassifier::gaul_level1();

        assert_eq!(classifier.classify(&backend, &square()), None);
        assert_eq!(classifier.classify(&backend, &square()), None);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_name_property_is_a_miss() {
        let backend = LookupBackend::named("Rajasthan");
        let mut classifier = RegionClassifier::new("FAO/GAUL/2015/level1", "ADM2_NAME");
        assert_eq!(classifier.classify(&backend, &square()), None);
    }
}
