//! TOML fixtures describing what a [`crate::MemoryBackend`] knows.
//!
//! ```toml
//! [[scenes]]
//! dataset = "COPERNICUS/S1_GRD"
//! date = "2023-04-12"
//! properties = { instrumentMode = "IW", transmitterReceiverPolarisation = ["VV", "VH"] }
//!
//! [[features]]
//! collection = "FAO/GAUL/2015/level1"
//! ring = [[69.5, 23.0], [78.3, 23.0], [78.3, 30.2], [69.5, 30.2]]
//! properties = { ADM1_NAME = "Rajasthan" }
//!
//! [reductions]
//! "mean:suitability" = { suitability = 0.52 }
//!
//! [series]
//! "COPERNICUS/S2_SR_HARMONIZED" = [{ date = "2024-01-05", value = 0.08 }]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use sarovar_core::error::{Result, SarovarError};
use sarovar_core::models::Bounds;
use sarovar_core::ports::{ReduceOutput, SeriesPoint};

/// One acquisition of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub dataset: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
    /// Area covered; scenes without one match every region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footprint: Option<Bounds>,
}

impl Scene {
    pub fn new(dataset: impl Into<String>, date: NaiveDate) -> Self {
        Self { dataset: dataset.into(), date, properties: serde_json::Map::new(), footprint: None }
    }

    pub fn with(mut self, property: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(property.into(), value.into());
        self
    }

    pub fn covering(mut self, footprint: Bounds) -> Self {
        self.footprint = Some(footprint);
        self
    }
}

/// A vector feature of a boundary collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureFeature {
    pub collection: String,
    /// Exterior ring as `[lon, lat]` pairs, closing vertex optional.
    pub ring: Vec<[f64; 2]>,
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub scenes: Vec<Scene>,
    #[serde(default)]
    pub features: Vec<FixtureFeature>,
    /// Scripted region statistics keyed by `<reducer>` or `<reducer>:<band>`.
    #[serde(default)]
    pub reductions: BTreeMap<String, ReduceOutput>,
    /// Scripted time series keyed by dataset.
    #[serde(default)]
    pub series: BTreeMap<String, Vec<SeriesPoint>>,
}

impl Fixture {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| SarovarError::Serialization(format!("Invalid backend fixture: {}", e)))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "Loading backend fixture");
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[[scenes]]
dataset = "COPERNICUS/S1_GRD"
date = "2023-04-12"
properties = { instrumentMode = "IW", orbitProperties_pass = "ASCENDING" }

[[features]]
collection = "FAO/GAUL/2015/level1"
ring = [[69.5, 23.0], [78.3, 23.0], [78.3, 30.2], [69.5, 30.2]]
properties = { ADM1_NAME = "Rajasthan" }

[reductions]
"min_max" = { precipitation_mean_min = 1.5, precipitation_mean_max = 9.0 }

[series]
"COPERNICUS/S2_SR_HARMONIZED" = [{ date = "2024-01-05", value = 0.08 }]
"#;

    #[test]
    fn test_parse_sample() {
        let fixture = Fixture::from_toml_str(SAMPLE).unwrap();
        assert_eq!(fixture.scenes.len(), 1);
        assert_eq!(fixture.scenes[0].date, NaiveDate::from_ymd_opt(2023, 4, 12).unwrap());
        assert_eq!(fixture.scenes[0].properties["instrumentMode"], "IW");
        assert_eq!(fixture.features[0].properties["ADM1_NAME"], "Rajasthan");
        assert_eq!(fixture.reductions["min_max"].get("precipitation_mean_max"), Some(9.0));
        assert_eq!(fixture.series["COPERNICUS/S2_SR_HARMONIZED"][0].value, 0.08);
    }

    #[test]
    fn test_empty_and_invalid() {
        assert_eq!(Fixture::from_toml_str("").unwrap(), Fixture::default());
        let err = Fixture::from_toml_str("[[scenes]]\ndataset = 3").unwrap_err();
        assert!(matches!(err, SarovarError::Serialization(_)));
    }

    #[test]
    fn test_from_file() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        assert_eq!(Fixture::from_file(file.path()).unwrap().scenes.len(), 1);

        assert!(matches!(Fixture::from_file("/nonexistent/fixture.toml"), Err(SarovarError::Io(_))));
    }
}
