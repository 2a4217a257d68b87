//! Prompts for the interactive session

use anyhow::{Context, Result};
use dialoguer::{Confirm, Input, Select};
use sarovar_analysis::{ModuleDescriptor, ParamKind, ParameterSchema};
use sarovar_core::models::{ModuleId, RawParameters};
use sarovar_geo::RoiInput;
use serde_json::Value;

use crate::commands::parse_point;

/// What the user gave as ROI
pub enum RoiPrompt {
    /// Locks as soon as it resolves
    Input(RoiInput),
    /// Staged until confirmed
    Drawing(Value),
}

/// Next step chosen from the session menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SelectModule,
    EditParameters,
    Run,
    Export,
    StaticMap,
    DiscardRoi,
    Quit,
}

const ACTIONS: [(Action, &str); 7] = [
    (Action::SelectModule, "Select analysis module"),
    (Action::EditParameters, "Edit parameters"),
    (Action::Run, "Run analysis"),
    (Action::Export, "Export result to storage"),
    (Action::StaticMap, "Prepare static map"),
    (Action::DiscardRoi, "Discard ROI"),
    (Action::Quit, "Quit"),
];

pub fn prompt_roi() -> Result<RoiPrompt> {
    let modes = ["Upload boundary file (KML)", "Point and radius", "Draw shape (GeoJSON)"];
    let mode = Select::new().with_prompt("Region of interest").items(&modes).default(0).interact()?;

    match mode {
        0 => {
            let path: String = Input::new().with_prompt("Boundary file path").interact_text()?;
            let content = std::fs::read(path.trim()).with_context(|| format!("Failed to read {}", path))?;
            Ok(RoiPrompt::Input(RoiInput::boundary_file(content)))
        }
        1 => {
            let point: String = Input::new()
                .with_prompt("Point (lat,lon)")
                .default("26.2389,73.0243".to_string())
                .interact_text()?;
            let (lat, lon) = parse_point(&point)?;
            let radius_m: f64 = Input::new().with_prompt("Radius (m)").default(1000.0).interact_text()?;
            Ok(RoiPrompt::Input(RoiInput::point_buffer(lat, lon, radius_m)))
        }
        _ => {
            let text: String = Input::new().with_prompt("GeoJSON geometry").interact_text()?;
            let shape = serde_json::from_str(&text).context("Shape is not valid GeoJSON")?;
            Ok(RoiPrompt::Drawing(shape))
        }
    }
}

pub fn confirm(prompt: &str) -> Result<bool> {
    Ok(Confirm::new().with_prompt(prompt).default(true).interact()?)
}

pub fn prompt_module(descriptors: &[ModuleDescriptor]) -> Result<ModuleId> {
    let names: Vec<&str> = descriptors.iter().map(|d| d.name).collect();
    let index = Select::new().with_prompt("Analysis module").items(&names).default(0).interact()?;
    descriptors.get(index).map(|d| d.id.clone()).context("No module selected")
}

/// Ask for every widget of the schema, offering its default
pub fn prompt_parameters(schema: &ParameterSchema) -> Result<RawParameters> {
    if let Some(note) = &schema.note {
        println!("  {}", note);
    }

    let mut raw = RawParameters::new();
    for param in &schema.params {
        let value = match &param.kind {
            ParamKind::Bool { default } => {
                Value::Bool(Confirm::new().with_prompt(param.label).default(*default).interact()?)
            }
            ParamKind::Choice { options, default } => {
                let current = options.iter().position(|o| o == default).unwrap_or(0);
                let index = Select::new().with_prompt(param.label).items(options).default(current).interact()?;
                Value::String(options.get(index).copied().unwrap_or(*default).to_string())
            }
            kind => {
                let answer: String = Input::new()
                    .with_prompt(param.label)
                    .default(kind.default_value().to_string())
                    .interact_text()?;
                // Typed answers are coerced by the schema
                Value::String(answer)
            }
        };
        raw.insert(param.name, value);
    }
    Ok(raw)
}

pub fn prompt_action(has_module: bool) -> Result<Action> {
    let items: Vec<&str> = ACTIONS.iter().map(|(_, label)| *label).collect();
    let default = if has_module { 2 } else { 0 };
    let index = Select::new().with_prompt("Next step").items(&items).default(default).interact()?;
    Ok(ACTIONS.get(index).map_or(Action::Quit, |(action, _)| *action))
}
