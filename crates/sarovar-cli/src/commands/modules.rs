//! Modules command implementation

use anyhow::Result;
use chrono::Local;
use sarovar_analysis::{ModuleRegistry, ParamKind, SchemaContext};
use sarovar_core::models::RegionTag;
use tabled::Tabled;

use crate::cli::ModulesArgs;
use crate::output::OutputWriter;
use crate::output_types::{ModuleInfo, ModulesOutput};

pub fn execute(args: &ModulesArgs, output: &OutputWriter) -> Result<()> {
    let registry = ModuleRegistry::standard();
    let region = args.region.clone().map(|name| RegionTag::from_lookup(Some(name)));
    let ctx = SchemaContext::new(region, Local::now().date_naive());

    let modules: Vec<ModuleInfo> = registry
        .ids()
        .iter()
        .filter_map(|id| registry.get(id))
        .map(|module| ModuleInfo {
            descriptor: module.descriptor(),
            schema: (args.params || output.is_json()).then(|| module.schema(&ctx)),
        })
        .collect();

    if output.is_json() {
        return output.result(ModulesOutput { region: args.region.clone(), modules });
    }

    output.section("Analysis Modules");

    #[derive(Tabled)]
    struct ModuleRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Description")]
        description: String,
    }

    let rows: Vec<ModuleRow> = modules
        .iter()
        .map(|m| ModuleRow {
            id: m.descriptor.id.to_string(),
            name: m.descriptor.name.to_string(),
            description: m.descriptor.description.to_string(),
        })
        .collect();
    output.table(rows);

    if !args.params {
        output.info("Use --params to list parameters");
        return Ok(());
    }

    #[derive(Tabled)]
    struct ParamRow {
        #[tabled(rename = "Parameter")]
        name: String,
        #[tabled(rename = "Type")]
        kind: String,
        #[tabled(rename = "Default")]
        default: String,
        #[tabled(rename = "Range")]
        range: String,
    }

    for module in &modules {
        let Some(schema) = &module.schema else { continue };
        output.section(module.descriptor.name);
        if let Some(note) = &schema.note {
            output.kv("Note", note);
        }

        let rows: Vec<ParamRow> = schema
            .params
            .iter()
            .map(|p| ParamRow {
                name: p.name.to_string(),
                kind: p.kind.type_name().to_string(),
                default: p.kind.default_value().to_string(),
                range: match &p.kind {
                    ParamKind::Float { min, max, .. } => format!("{} to {}", min, max),
                    ParamKind::Int { min, max, .. } => format!("{} to {}", min, max),
                    ParamKind::Choice { options, .. } => options.join(" | "),
                    ParamKind::Bool { .. } | ParamKind::Date { .. } => String::new(),
                },
            })
            .collect();
        output.table(rows);
    }

    Ok(())
}
