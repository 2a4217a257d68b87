//! Configuration and backend loading for CLI commands

use anyhow::{Context, Result};
use sarovar_backend::{HttpBackend, MemoryBackend};
use sarovar_core::config::{CliConfigOverrides, LayeredConfig};
use sarovar_core::ports::ComputeBackend;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::{BackendChoice, Cli};
use crate::errors;

/// Config file picked up from the working directory when --config is absent
pub const DEFAULT_CONFIG_FILE: &str = "sarovar.toml";

/// The config file in effect, if any
pub fn config_path(cli: &Cli) -> Option<PathBuf> {
    cli.config.clone().or_else(|| {
        let path = PathBuf::from(DEFAULT_CONFIG_FILE);
        path.is_file().then_some(path)
    })
}

/// Load layered configuration: defaults, file, environment, then flags
pub fn load_config(cli: &Cli) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();
    if let Some(path) = config_path(cli) {
        config = config
            .load_from_file(&path)
            .with_context(|| format!("Failed to load configuration file {}", path.display()))?;
    }
    let mut config = config.load_from_env();

    config.update_from_cli(CliConfigOverrides {
        backend_endpoint: cli.endpoint.clone(),
        project_id: cli.project.clone(),
        ..Default::default()
    });
    Ok(config)
}

/// Build the compute backend selected on the command line
pub fn build_backend(cli: &Cli, config: &LayeredConfig) -> Result<Arc<dyn ComputeBackend>> {
    match cli.backend {
        BackendChoice::Http => {
            let backend = HttpBackend::from_config(config);
            tracing::info!(endpoint = backend.endpoint(), "Using remote compute backend");
            Ok(Arc::new(backend))
        }
        BackendChoice::Memory => {
            let backend = match &cli.fixture {
                Some(path) => MemoryBackend::from_fixture_file(path).map_err(|e| {
                    errors::fixture_failed(&path.display().to_string(), &e.to_string())
                })?,
                None => MemoryBackend::demo().context("Failed to load the bundled demo fixture")?,
            };
            Ok(Arc::new(backend))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use sarovar_core::config::ConfigSource;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    #[serial]
    fn test_flags_override_file_and_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "project_id = \"from-file\"\nexport_folder = \"Lakes\"").unwrap();
        std::env::set_var("SAROVAR_PROJECT_ID", "from-env");

        let path = file.path().to_string_lossy().to_string();
        let cli = Cli::try_parse_from(["sarovar", "--config", &path, "config"]).unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.project_id.value, "from-env");
        assert_eq!(config.project_id.source, ConfigSource::Environment);
        assert_eq!(config.export_folder.value, "Lakes");
        assert_eq!(config.export_folder.source, ConfigSource::File);

        let cli = Cli::try_parse_from(["sarovar", "--config", &path, "--project", "from-flag", "config"]).unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.project_id.value, "from-flag");
        assert_eq!(config.project_id.source, ConfigSource::Cli);

        std::env::remove_var("SAROVAR_PROJECT_ID");
    }

    #[test]
    #[serial]
    fn test_missing_config_file_is_an_error() {
        let cli = Cli::try_parse_from(["sarovar", "--config", "/nonexistent/sarovar.toml", "config"]).unwrap();
        assert!(load_config(&cli).is_err());
    }

    #[test]
    fn test_memory_backend_from_demo_fixture() {
        let cli = Cli::try_parse_from(["sarovar", "config"]).unwrap();
        let backend = build_backend(&cli, &LayeredConfig::with_defaults()).unwrap();
        let query = sarovar_core::ports::FeatureQuery {
            collection: "FAO/GAUL/2015/level1".to_string(),
            contains: [73.0, 27.0],
        };
        let feature = backend.first_feature(&query).unwrap().unwrap();
        assert_eq!(feature.property_str("ADM1_NAME"), Some("Rajasthan"));
    }
}
