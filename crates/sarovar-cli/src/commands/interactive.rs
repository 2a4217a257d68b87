//! Interactive session command implementation
//!
//! Every menu choice is one render pass: the module and widget values are
//! captured in a snapshot, and a previously triggered analysis reruns with
//! the new values.

use anyhow::Result;
use sarovar_analysis::ModuleRegistry;
use sarovar_core::models::RawParameters;
use sarovar_core::ports::{RecordingMap, RecordingPanel};
use sarovar_session::{InputSnapshot, Orchestrator, SessionError, SessionOptions};
use std::sync::Arc;

use super::lock_roi;
use crate::cli::{Cli, InteractiveArgs};
use crate::config_loader::{build_backend, load_config};
use crate::interactive::{self as prompts, Action, RoiPrompt};
use crate::output::OutputWriter;
use crate::render;

pub fn execute(cli: &Cli, args: &InteractiveArgs, output: &OutputWriter) -> Result<()> {
    if output.is_json() {
        anyhow::bail!("The interactive session has no JSON mode. Use `sarovar run --json` instead");
    }

    let config = load_config(cli)?;
    let backend = build_backend(cli, &config)?;
    let registry = Arc::new(ModuleRegistry::standard());
    let mut session = Orchestrator::new(backend, registry.clone(), SessionOptions::from_config(&config));
    if let Some(today) = args.today {
        session = session.with_today(today);
    }

    println!("\nGeoSarovar Session\n");
    acquire_roi(&mut session, output)?;

    let mut snapshot: Option<InputSnapshot> = None;
    loop {
        let action = prompts::prompt_action(snapshot.is_some())?;
        let next = match action {
            Action::Quit => break,
            Action::SelectModule => {
                let module = prompts::prompt_module(&registry.descriptors())?;
                Some(InputSnapshot::new(module, RawParameters::new()))
            }
            Action::EditParameters => match &snapshot {
                Some(current) => {
                    let schema = match session.schema() {
                        Ok(schema) => schema,
                        Err(e) => {
                            output.error(e);
                            continue;
                        }
                    };
                    Some(InputSnapshot::new(current.module.clone(), prompts::prompt_parameters(&schema)?))
                }
                None => {
                    output.warning("Select a module first");
                    continue;
                }
            },
            Action::Run => match &snapshot {
                Some(current) => Some(current.clone().run()),
                None => {
                    output.warning("Select a module first");
                    continue;
                }
            },
            Action::Export => {
                match session.export() {
                    Ok(ticket) => output.success(format!("Export started: {} (task {})", ticket.description, ticket.task_id)),
                    Err(e) => output.error(e),
                }
                continue;
            }
            Action::StaticMap => {
                match session.static_map(None) {
                    Ok(request) => output.success(format!("Static map ready: {}", request.image_url)),
                    Err(e) => output.error(e),
                }
                continue;
            }
            Action::DiscardRoi => {
                session.discard_roi()?;
                output.info("ROI discarded");
                acquire_roi(&mut session, output)?;
                continue;
            }
        };

        if let Some(next) = next {
            render_pass(&mut session, &next, output);
            // The run flag belongs to one pass only
            snapshot = Some(InputSnapshot { run: false, ..next });
        }
    }

    output.info("Session closed");
    Ok(())
}

/// Prompt until an ROI is locked
fn acquire_roi(session: &mut Orchestrator, output: &OutputWriter) -> Result<()> {
    loop {
        let outcome = match prompts::prompt_roi() {
            Ok(RoiPrompt::Input(input)) => lock_roi(session, &input, output).map(Some),
            Ok(RoiPrompt::Drawing(shape)) => stage_and_confirm(session, shape),
            Err(e) => Err(e),
        };
        match outcome {
            Ok(Some(_)) => return Ok(()),
            Ok(None) => continue,
            Err(e) => output.error(format!("{:#}", e)),
        }
    }
}

fn stage_and_confirm(
    session: &mut Orchestrator,
    shape: serde_json::Value,
) -> Result<Option<sarovar_core::models::RegionTag>> {
    session.stage_drawing(shape)?;
    if prompts::confirm("Lock this shape as the region of interest?")? {
        Ok(Some(session.confirm_drawing()?))
    } else {
        session.discard_roi()?;
        Ok(None)
    }
}

fn render_pass(session: &mut Orchestrator, snapshot: &InputSnapshot, output: &OutputWriter) {
    let mut map = RecordingMap::new();
    let mut panel = RecordingPanel::new();

    match session.render_pass(snapshot, &mut map, &mut panel) {
        Ok(_) => {
            render::print_map(&map);
            render::print_panel(&panel);
        }
        Err(SessionError::PermissionDenied { message, remediation }) => {
            output.error(message);
            output.info(remediation);
        }
        Err(e) => output.error(e),
    }
}
