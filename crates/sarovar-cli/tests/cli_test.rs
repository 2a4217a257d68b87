//! Integration tests for the `sarovar` binary
//!
//! These run the built binary against the bundled demo fixture.

use std::io::Write;
use std::process::{Command, Output};

fn sarovar(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sarovar"))
        .args(args)
        .env_remove("SAROVAR_PROJECT_ID")
        .env_remove("SAROVAR_EXPORT_FOLDER")
        .env("RUST_LOG", "error")
        .output()
        .expect("Failed to execute command")
}

fn json_stdout(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("Output should be valid JSON")
}

fn jodhpur_kml() -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".kml").tempfile().unwrap();
    write!(
        file,
        r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2"><Placemark><Polygon><outerBoundaryIs><LinearRing>
<coordinates>72.9,26.2,0 73.1,26.2,0 73.1,26.4,0 72.9,26.4,0 72.9,26.2,0</coordinates>
</LinearRing></outerBoundaryIs></Polygon></Placemark></kml>"#
    )
    .unwrap();
    file
}

#[test]
fn test_modules_json_lists_all_modules() {
    let output = sarovar(&["--json", "modules", "--region", "Rajasthan"]);
    assert!(output.status.success());

    let parsed = json_stdout(&output);
    assert_eq!(parsed["status"], "success");
    let modules = parsed["data"]["modules"].as_array().unwrap();
    assert_eq!(modules.len(), 5);

    let rwh = modules.iter().find(|m| m["id"] == "rwh").unwrap();
    assert_eq!(rwh["schema"]["note"], "Detected zone: Arid/Semi-Arid");
}

#[test]
fn test_resolve_boundary_file_in_rajasthan() {
    let kml = jodhpur_kml();
    let path = kml.path().to_string_lossy().to_string();
    let output = sarovar(&["--json", "resolve", "--boundary", &path]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let parsed = json_stdout(&output);
    assert_eq!(parsed["data"]["label"], "Rajasthan");
    assert_eq!(parsed["data"]["mode"], "boundary file");
    assert_eq!(parsed["data"]["vertex_count"], 4);
}

#[test]
fn test_resolve_point_outside_regions_is_custom_area() {
    let output = sarovar(&["--json", "resolve", "--point", "-33.9,18.4", "--radius", "500"]);
    assert!(output.status.success());

    let parsed = json_stdout(&output);
    assert_eq!(parsed["data"]["region"]["kind"], "unclassified");
    assert_eq!(parsed["data"]["label"], "Custom Area");
}

#[test]
fn test_run_rwh_with_export() {
    let kml = jodhpur_kml();
    let path = kml.path().to_string_lossy().to_string();
    let output = sarovar(&[
        "--json", "run", "rwh", "--boundary", &path, "--today", "2024-03-01", "--export",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let data = &json_stdout(&output)["data"];
    assert_eq!(data["module"], "rwh");
    assert_eq!(data["region"], "Rajasthan");
    assert!(!data["result"]["raster"].is_null());
    assert_eq!(data["export"]["description"], "GeoSarovar_Rainwater_20240301");
}

#[test]
fn test_invalid_boundary_file_fails() {
    let mut file = tempfile::Builder::new().suffix(".kml").tempfile().unwrap();
    write!(file, "<kml><Placemark/></kml>").unwrap();
    let path = file.path().to_string_lossy().to_string();

    let output = sarovar(&["resolve", "--boundary", &path]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Could not resolve the region of interest"));
}

#[test]
fn test_unknown_module_fails() {
    let output = sarovar(&["run", "drought", "--point", "26.3,73.0"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown analysis module: drought"));
}

#[test]
fn test_config_reports_sources() {
    let output = Command::new(env!("CARGO_BIN_EXE_sarovar"))
        .args(["--json", "--endpoint", "http://compute.internal:9000", "config"])
        .env("SAROVAR_PROJECT_ID", "lake-watch")
        .env("RUST_LOG", "error")
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());

    let entries = json_stdout(&output)["data"]["entries"].as_array().unwrap().clone();
    let entry = |key: &str| entries.iter().find(|e| e["key"] == key).unwrap().clone();
    assert_eq!(entry("project_id")["value"], "lake-watch");
    assert_eq!(entry("project_id")["source"], "Environment");
    assert_eq!(entry("backend_endpoint")["source"], "Cli");
    assert_eq!(entry("export_folder")["source"], "Default");
}
