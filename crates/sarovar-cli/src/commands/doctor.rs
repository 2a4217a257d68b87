//! Doctor command implementation

use anyhow::Result;
use console::style;
use sarovar_core::models::CollectionQuery;
use sarovar_core::ports::FeatureQuery;

use crate::cli::{BackendChoice, Cli, DoctorArgs};
use crate::config_loader::{build_backend, load_config};
use crate::output::OutputWriter;
use crate::output_types::{CheckResult, DoctorOutput};

/// Point in Rajasthan used to check the region collection
const SAMPLE_POINT: [f64; 2] = [73.0, 27.0];

pub fn execute(cli: &Cli, args: &DoctorArgs, output: &OutputWriter) -> Result<()> {
    let mut checks = Vec::new();

    let config = match load_config(cli) {
        Ok(config) => {
            checks.push(check("Config", true, "Valid configuration"));
            config
        }
        Err(e) => {
            checks.push(check("Config", false, format!("{:#}", e)));
            return report(cli, checks, output);
        }
    };

    if config.project_id.value == "your-project-id" {
        checks.push(check("Project", false, "Project id is the placeholder; set SAROVAR_PROJECT_ID or --project"));
    } else {
        checks.push(check("Project", true, config.project_id.value.clone()));
    }

    let backend = match build_backend(cli, &config) {
        Ok(backend) => {
            let detail = match cli.backend {
                BackendChoice::Http => format!("HTTP at {}", config.backend_endpoint.value),
                BackendChoice::Memory => "In-memory fixture".to_string(),
            };
            checks.push(check("Backend", true, detail));
            backend
        }
        Err(e) => {
            checks.push(check("Backend", false, e.to_string()));
            return report(cli, checks, output);
        }
    };

    let query = FeatureQuery { collection: config.region_collection.value.clone(), contains: SAMPLE_POINT };
    match backend.first_feature(&query) {
        Ok(Some(feature)) => {
            let name = feature.property_str(&config.region_name_property.value).unwrap_or("(unnamed)");
            checks.push(check("Region lookup", true, format!("Sample point falls in {}", name)));
        }
        Ok(None) => checks.push(check("Region lookup", false, "No region contains the sample point")),
        Err(e) if e.is_permission() => {
            let remediation = e.remediation(&config.project_id.value).unwrap_or_default();
            checks.push(check("Region lookup", false, format!("{} ({})", e, remediation)));
        }
        Err(e) => checks.push(check("Region lookup", false, e.to_string())),
    }

    if args.verbose {
        match backend.collection_size(&CollectionQuery::new("COPERNICUS/S1_GRD")) {
            Ok(count) => checks.push(check("Sentinel-1 scenes", true, format!("{} available", count))),
            Err(e) => checks.push(check("Sentinel-1 scenes", false, e.to_string())),
        }
    }

    report(cli, checks, output)
}

fn check(name: &str, passed: bool, detail: impl Into<String>) -> CheckResult {
    CheckResult { name: name.to_string(), passed, detail: detail.into() }
}

fn report(cli: &Cli, checks: Vec<CheckResult>, output: &OutputWriter) -> Result<()> {
    let passed = checks.iter().filter(|c| c.passed).count();
    let total = checks.len();
    let backend = format!("{:?}", cli.backend).to_lowercase();

    if output.is_json() {
        return output.result(DoctorOutput { backend, checks, passed, total });
    }

    println!("\n{}", style("GeoSarovar Health Check").bold().underlined());
    println!("{}", style("═".repeat(60)).dim());
    println!();

    for c in &checks {
        let mark = if c.passed { style("✓").green() } else { style("✗").red() };
        println!("{} {}: {}", mark, c.name, c.detail);
    }

    println!();
    if passed == total {
        println!("{} All checks passed ({}/{})", style("✓").green().bold(), passed, total);
    } else {
        println!("{} {}/{} checks passed", style("⚠").yellow().bold(), passed, total);
    }
    Ok(())
}
