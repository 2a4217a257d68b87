//! End-to-end module runs against the in-memory backend.

use chrono::NaiveDate;

use sarovar_analysis::{AnalysisModule, ModuleContext, ModuleRegistry, SchemaContext};
use sarovar_backend::{MemoryBackend, Scene};
use sarovar_core::error::BackendError;
use sarovar_core::models::{Geometry, ModuleId, RawParameters, RegionTag, VisualizationSpec};
use sarovar_core::ports::{PanelEntry, RecordingMap, RecordingPanel, SeriesPoint};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn jodhpur() -> Geometry {
    Geometry::polygon(vec![[72.9, 26.2], [73.1, 26.2], [73.1, 26.4], [72.9, 26.4]]).unwrap()
}

fn s1_scene(day: NaiveDate) -> Scene {
    Scene::new("COPERNICUS/S1_GRD", day)
        .with("instrumentMode", "IW")
        .with("transmitterReceiverPolarisation", serde_json::json!(["VV", "VH"]))
        .with("resolution_meters", 10)
        .with("orbitProperties_pass", "DESCENDING")
}

struct Run {
    raster: Option<sarovar_core::models::RasterHandle>,
    vis: VisualizationSpec,
    map: RecordingMap,
    panel: RecordingPanel,
}

fn run(
    backend: &MemoryBackend,
    id: &ModuleId,
    region: Option<RegionTag>,
    raw: RawParameters,
) -> Run {
    let registry = ModuleRegistry::standard();
    let module = registry.get(id).unwrap();
    let params = module.schema(&SchemaContext::new(region, date(2024, 3, 1))).validate(&raw).unwrap();

    let mut map = RecordingMap::new();
    let mut panel = RecordingPanel::new();
    let (raster, vis) = {
        let mut ctx = ModuleContext::new(backend, &mut map, &mut panel, "demo-project");
        module.render(&mut ctx, &jodhpur(), &params)
    };
    Run { raster, vis, map, panel }
}

#[test]
fn test_rwh_rajasthan_defaults() {
    let backend = MemoryBackend::new();
    backend.script_reduction("mean:suitability", [("suitability", 0.52)].into_iter().collect());

    let out = run(
        &backend,
        &ModuleId::RAINWATER_HARVESTING,
        Some(RegionTag::Named("Rajasthan".to_string())),
        RawParameters::new(),
    );

    assert!(out.raster.is_some());
    assert_eq!(out.vis.min, Some(0.0));
    assert_eq!(out.vis.max, Some(0.8));
    assert!(out.map.layer("RWH Suitability Index").is_some());
    assert!(!out.map.layer("Rainfall Input").unwrap().visible);
    assert_eq!(out.panel.metric_value("Avg Suitability"), Some("0.52 / 1.0"));

    let progress: Vec<f64> = out
        .panel
        .entries
        .iter()
        .filter_map(|e| match e {
            PanelEntry::Progress { fraction, .. } => Some(*fraction),
            _ => None,
        })
        .collect();
    assert_eq!(progress, vec![0.35, 0.15, 0.25, 0.10, 0.15]);
}

#[test]
fn test_flood_without_scenes_reports_warning() {
    let backend = MemoryBackend::new();
    // Only pre-event coverage
    backend.add_scene(s1_scene(date(2023, 4, 9)));

    let out = run(&backend, &ModuleId::FLOOD, None, RawParameters::new());

    assert!(out.raster.is_none());
    assert_eq!(out.vis, VisualizationSpec::empty());
    assert!(out.panel.has_heading("Flood Extent Mapping Results"));
    assert_eq!(out.panel.warnings().len(), 1);
    assert!(out.panel.errors().is_empty());
    assert!(out.map.layers.is_empty());
}

#[test]
fn test_flood_with_scenes_reports_extent() {
    let backend = MemoryBackend::new();
    backend.add_scenes([s1_scene(date(2023, 4, 9)), s1_scene(date(2023, 10, 2))]);
    backend.script_reduction("sum:area", [("area", 1_834_500.0)].into_iter().collect());

    let out = run(&backend, &ModuleId::FLOOD, None, RawParameters::new());

    assert!(out.raster.is_some());
    assert_eq!(out.vis.class_names.as_deref(), Some(&["Flood Extent".to_string()][..]));
    assert!(out.map.layer("Estimated Flood Extent").is_some());
    assert!(out.panel.metric_value("Estimated Extent").unwrap().starts_with("183.45"));
}

#[test]
fn test_permission_failure_carries_remediation() {
    let backend = MemoryBackend::new();
    backend.fail_on("collection_size", BackendError::from_message("serviceUsage.services.use denied"));

    let out = run(&backend, &ModuleId::ENCROACHMENT, None, RawParameters::new());

    assert!(out.raster.is_none());
    assert_eq!(out.panel.errors().len(), 1);
    assert!(out.panel.errors()[0].starts_with("Analysis failed:"));
    let hint = out.panel.entries.iter().find_map(|e| match e {
        PanelEntry::Info { text } => Some(text.clone()),
        _ => None,
    });
    assert!(hint.unwrap().ends_with("project=demo-project"));
}

#[test]
fn test_water_quality_series_and_empty_series() {
    let backend = MemoryBackend::new();
    backend.add_scene(Scene::new("COPERNICUS/S2_SR_HARMONIZED", date(2024, 1, 10)));
    backend.script_series(
        "COPERNICUS/S2_SR_HARMONIZED",
        vec![
            SeriesPoint { date: date(2024, 2, 1), value: 0.07 },
            SeriesPoint { date: date(2024, 1, 10), value: 0.05 },
            SeriesPoint { date: date(2024, 1, 20), value: f64::NAN },
        ],
    );
    let raw = RawParameters::new().with("start", "2024-01-01").with("end", "2024-03-01");

    let out = run(&backend, &ModuleId::WATER_QUALITY, None, raw.clone());
    assert!(out.raster.is_some());
    let chart = out.panel.entries.iter().find_map(|e| match e {
        PanelEntry::Chart { points, .. } => Some(points.clone()),
        _ => None,
    });
    let dates: Vec<NaiveDate> = chart.unwrap().iter().map(|p| p.date).collect();
    assert_eq!(dates, vec![date(2024, 1, 10), date(2024, 2, 1)]);
    assert!(out.panel.entries.iter().any(|e| matches!(
        e,
        PanelEntry::Download { file_name, .. } if file_name == "water_quality_ts.csv"
    )));

    backend.script_series("COPERNICUS/S2_SR_HARMONIZED", Vec::new());
    let out = run(&backend, &ModuleId::WATER_QUALITY, None, raw);
    assert!(out.raster.is_some());
    assert_eq!(
        out.panel.warnings(),
        vec!["No clear water pixels found (Try reducing cloud threshold)."]
    );
}

#[test]
fn test_rainfall_outside_coverage_is_empty() {
    let backend = MemoryBackend::new();
    backend.add_scene(Scene::new("UCSB-CHG/CHIRPS/DAILY", date(2020, 7, 1)));

    let out = run(&backend, &ModuleId::RAINFALL, None, RawParameters::new());
    assert!(out.raster.is_none());
    assert_eq!(out.panel.warnings().len(), 1);
    assert_eq!(backend.calls("reduce_region"), 0);
}
