//! Config command implementation

use anyhow::Result;
use tabled::Tabled;

use crate::cli::Cli;
use crate::config_loader::{config_path, load_config};
use crate::output::OutputWriter;
use crate::output_types::{ConfigEntry, ConfigOutput};

pub fn execute(cli: &Cli, output: &OutputWriter) -> Result<()> {
    let config = load_config(cli)?;

    let mut entries: Vec<ConfigEntry> = config
        .to_inspection_map()
        .into_iter()
        .map(|(key, (value, source))| ConfigEntry { key, value, source: format!("{:?}", source) })
        .collect();
    entries.sort_by(|a, b| a.key.cmp(&b.key));

    if output.is_json() {
        return output.result(ConfigOutput { entries });
    }

    output.section("Configuration");
    match config_path(cli) {
        Some(path) => output.kv("File", path.display()),
        None => output.kv("File", "(none)"),
    }

    #[derive(Tabled)]
    struct ConfigRow {
        #[tabled(rename = "Key")]
        key: String,
        #[tabled(rename = "Value")]
        value: String,
        #[tabled(rename = "Source")]
        source: String,
    }

    let rows: Vec<ConfigRow> = entries
        .into_iter()
        .map(|e| ConfigRow { key: e.key, value: e.value, source: e.source })
        .collect();
    output.table(rows);
    Ok(())
}
