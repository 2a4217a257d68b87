//! Run command implementation

use anyhow::Result;
use sarovar_analysis::ModuleRegistry;
use sarovar_core::models::{ModuleId, RawParameters};
use sarovar_core::ports::{RecordingMap, RecordingPanel};
use sarovar_session::{Orchestrator, SessionError, SessionOptions};
use std::sync::Arc;

use super::{lock_roi, roi_input};
use crate::cli::{Cli, RunArgs};
use crate::config_loader::{build_backend, load_config};
use crate::errors;
use crate::output::OutputWriter;
use crate::output_types::RunOutput;
use crate::progress::{create_spinner, finish_error, finish_success};
use crate::render;

pub fn execute(cli: &Cli, args: &RunArgs, output: &OutputWriter) -> Result<()> {
    let registry = Arc::new(ModuleRegistry::standard());
    let module: ModuleId = args.module.parse()?;
    if !registry.contains(&module) {
        let known: Vec<String> = registry.ids().iter().map(ToString::to_string).collect();
        return Err(errors::unknown_module(&args.module, &known).into());
    }
    let raw = RawParameters::from_pairs(&args.params)?;

    let config = load_config(cli)?;
    let backend = build_backend(cli, &config)?;
    let input = roi_input(&args.roi, args.radius)?;

    let mut session = Orchestrator::new(backend, registry, SessionOptions::from_config(&config));
    if let Some(today) = args.today {
        session = session.with_today(today);
    }

    let region = lock_roi(&mut session, &input, output)?;
    session.select_module(&module)?;
    session.derive_parameters(&raw)?;

    let mut map = RecordingMap::new();
    let mut panel = RecordingPanel::new();
    let spinner = create_spinner("Running analysis...", output.is_json());
    let result = match session.run(&mut map, &mut panel) {
        Ok(result) => {
            finish_success(&spinner, "Analysis finished");
            result.clone()
        }
        Err(SessionError::PermissionDenied { message, remediation }) => {
            finish_error(&spinner, "Analysis halted");
            return Err(errors::permission_denied(&message, &remediation).into());
        }
        Err(e) => {
            finish_error(&spinner, "Analysis failed");
            return Err(e.into());
        }
    };

    let export = if args.export {
        match session.export() {
            Ok(ticket) => Some(ticket),
            Err(e) => {
                output.warning(format!("Export not started: {}", e));
                None
            }
        }
    } else {
        None
    };

    let static_map = if args.static_map {
        match session.static_map(None) {
            Ok(request) => Some(request),
            Err(e) => {
                output.warning(format!("Static map not prepared: {}", e));
                None
            }
        }
    } else {
        None
    };

    let run = RunOutput {
        module: module.to_string(),
        region: region.label().to_string(),
        result,
        map,
        panel,
        export,
        static_map,
    };

    if output.is_json() {
        return output.result(run);
    }

    render::print_map(&run.map);
    render::print_panel(&run.panel);
    if !run.result.has_raster() {
        output.warning("The module produced no result layer");
    }
    if let Some(ticket) = &run.export {
        output.success(format!("Export started: {} (task {})", ticket.description, ticket.task_id));
    }
    if let Some(request) = &run.static_map {
        output.success(format!(
            "Static map ready: {} ({:.1} x {:.1} in)",
            request.image_url, request.figure_width_in, request.figure_height_in
        ));
    }
    Ok(())
}
