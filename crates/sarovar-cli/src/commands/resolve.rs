//! Resolve command implementation

use anyhow::{Context, Result};
use sarovar_analysis::ModuleRegistry;
use sarovar_session::{Orchestrator, SessionOptions};
use std::sync::Arc;

use super::{lock_roi, roi_input};
use crate::cli::{Cli, ResolveArgs};
use crate::config_loader::{build_backend, load_config};
use crate::output::OutputWriter;
use crate::output_types::ResolveOutput;

pub fn execute(cli: &Cli, args: &ResolveArgs, output: &OutputWriter) -> Result<()> {
    let config = load_config(cli)?;
    let backend = build_backend(cli, &config)?;
    let input = roi_input(&args.roi, args.radius)?;

    let mut session = Orchestrator::new(
        backend,
        Arc::new(ModuleRegistry::standard()),
        SessionOptions::from_config(&config),
    );
    let region = lock_roi(&mut session, &input, output)?;

    let geometry = session.state().roi.clone().context("Session has no ROI after locking")?;
    let result = ResolveOutput {
        mode: input.mode_name().to_string(),
        label: region.label().to_string(),
        region,
        vertex_count: geometry.vertex_count(),
        bounds: geometry.bounds(),
        geometry,
    };

    if output.is_json() {
        return output.result(result);
    }

    output.section("Region of Interest");
    output.kv("Input", &result.mode);
    output.kv("Region", &result.label);
    output.kv("Vertices", result.vertex_count);
    if let Some(bounds) = &result.bounds {
        output.kv(
            "Bounds",
            format!(
                "{:.4}, {:.4} to {:.4}, {:.4}",
                bounds.min_lon, bounds.min_lat, bounds.max_lon, bounds.max_lat
            ),
        );
    }
    Ok(())
}
