use crate::error::{Result, SarovarError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for GeoSarovar
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub backend_endpoint: ConfigValue<String>,
    pub project_id: ConfigValue<String>,
    pub request_timeout_secs: ConfigValue<u64>,
    pub simplify_tolerance_m: ConfigValue<f64>,
    pub region_collection: ConfigValue<String>,
    pub region_name_property: ConfigValue<String>,
    pub export_folder: ConfigValue<String>,
    pub export_scale_m: ConfigValue<f64>,
}

impl Default for LayeredConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            backend_endpoint: ConfigValue::new(
                "http://localhost:8085".to_string(),
                ConfigSource::Default,
            ),
            project_id: ConfigValue::new("your-project-id".to_string(), ConfigSource::Default),
            request_timeout_secs: ConfigValue::new(120, ConfigSource::Default),
            simplify_tolerance_m: ConfigValue::new(50.0, ConfigSource::Default),
            region_collection: ConfigValue::new(
                "FAO/GAUL/2015/level1".to_string(),
                ConfigSource::Default,
            ),
            region_name_property: ConfigValue::new("ADM1_NAME".to_string(), ConfigSource::Default),
            export_folder: ConfigValue::new("GeoSarovar_Exports".to_string(), ConfigSource::Default),
            export_scale_m: ConfigValue::new(30.0, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| SarovarError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| SarovarError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(endpoint) = file_config.backend_endpoint {
            self.backend_endpoint.update(endpoint, ConfigSource::File);
        }

        if let Some(project_id) = file_config.project_id {
            self.project_id.update(project_id, ConfigSource::File);
        }

        if let Some(timeout) = file_config.request_timeout_secs {
            self.request_timeout_secs.update(timeout, ConfigSource::File);
        }

        if let Some(tolerance) = file_config.simplify_tolerance_m {
            let tolerance = validate_positive("simplify_tolerance_m", tolerance)?;
            self.simplify_tolerance_m.update(tolerance, ConfigSource::File);
        }

        if let Some(collection) = file_config.region_collection {
            self.region_collection.update(collection, ConfigSource::File);
        }

        if let Some(property) = file_config.region_name_property {
            self.region_name_property.update(property, ConfigSource::File);
        }

        if let Some(folder) = file_config.export_folder {
            self.export_folder.update(folder, ConfigSource::File);
        }

        if let Some(scale) = file_config.export_scale_m {
            let scale = validate_positive("export_scale_m", scale)?;
            self.export_scale_m.update(scale, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // SAROVAR_BACKEND_ENDPOINT
        if let Ok(endpoint) = env::var("SAROVAR_BACKEND_ENDPOINT") {
            self.backend_endpoint.update(endpoint, ConfigSource::Environment);
        }

        // SAROVAR_PROJECT_ID
        if let Ok(project_id) = env::var("SAROVAR_PROJECT_ID") {
            self.project_id.update(project_id, ConfigSource::Environment);
        }

        // SAROVAR_REQUEST_TIMEOUT
        if let Ok(timeout_str) = env::var("SAROVAR_REQUEST_TIMEOUT") {
            match parse_timeout(&timeout_str) {
                Ok(timeout) => self.request_timeout_secs.update(timeout, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid SAROVAR_REQUEST_TIMEOUT value '{}': expected whole seconds",
                    timeout_str
                ),
            }
        }

        // SAROVAR_SIMPLIFY_TOLERANCE
        if let Ok(tolerance_str) = env::var("SAROVAR_SIMPLIFY_TOLERANCE") {
            match parse_meters("simplify_tolerance_m", &tolerance_str) {
                Ok(tolerance) => {
                    self.simplify_tolerance_m.update(tolerance, ConfigSource::Environment)
                }
                Err(_) => tracing::warn!(
                    "Invalid SAROVAR_SIMPLIFY_TOLERANCE value '{}': expected positive meters",
                    tolerance_str
                ),
            }
        }

        // SAROVAR_REGION_COLLECTION
        if let Ok(collection) = env::var("SAROVAR_REGION_COLLECTION") {
            self.region_collection.update(collection, ConfigSource::Environment);
        }

        // SAROVAR_REGION_PROPERTY
        if let Ok(property) = env::var("SAROVAR_REGION_PROPERTY") {
            self.region_name_property.update(property, ConfigSource::Environment);
        }

        // SAROVAR_EXPORT_FOLDER
        if let Ok(folder) = env::var("SAROVAR_EXPORT_FOLDER") {
            self.export_folder.update(folder, ConfigSource::Environment);
        }

        // SAROVAR_EXPORT_SCALE
        if let Ok(scale_str) = env::var("SAROVAR_EXPORT_SCALE") {
            match parse_meters("export_scale_m", &scale_str) {
                Ok(scale) => self.export_scale_m.update(scale, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid SAROVAR_EXPORT_SCALE value '{}': expected positive meters",
                    scale_str
                ),
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(endpoint) = overrides.backend_endpoint {
            self.backend_endpoint.update(endpoint, ConfigSource::Cli);
        }

        if let Some(project_id) = overrides.project_id {
            self.project_id.update(project_id, ConfigSource::Cli);
        }

        if let Some(timeout) = overrides.request_timeout_secs {
            self.request_timeout_secs.update(timeout, ConfigSource::Cli);
        }

        if let Some(tolerance) = overrides.simplify_tolerance_m {
            self.simplify_tolerance_m.update(tolerance, ConfigSource::Cli);
        }
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "backend_endpoint".to_string(),
            (self.backend_endpoint.value.clone(), self.backend_endpoint.source),
        );
        map.insert("project_id".to_string(), (self.project_id.value.clone(), self.project_id.source));
        map.insert(
            "request_timeout_secs".to_string(),
            (format!("{}s", self.request_timeout_secs.value), self.request_timeout_secs.source),
        );
        map.insert(
            "simplify_tolerance_m".to_string(),
            (format!("{} m", self.simplify_tolerance_m.value), self.simplify_tolerance_m.source),
        );
        map.insert(
            "region_collection".to_string(),
            (self.region_collection.value.clone(), self.region_collection.source),
        );
        map.insert(
            "region_name_property".to_string(),
            (self.region_name_property.value.clone(), self.region_name_property.source),
        );
        map.insert(
            "export_folder".to_string(),
            (self.export_folder.value.clone(), self.export_folder.source),
        );
        map.insert(
            "export_scale_m".to_string(),
            (format!("{} m", self.export_scale_m.value), self.export_scale_m.source),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    backend_endpoint: Option<String>,
    project_id: Option<String>,
    request_timeout_secs: Option<u64>,
    simplify_tolerance_m: Option<f64>,
    region_collection: Option<String>,
    region_name_property: Option<String>,
    export_folder: Option<String>,
    export_scale_m: Option<f64>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub backend_endpoint: Option<String>,
    pub project_id: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub simplify_tolerance_m: Option<f64>,
}

/// Parse a request timeout in whole seconds
pub fn parse_timeout(s: &str) -> Result<u64> {
    match s.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(SarovarError::ConfigInvalid {
            key: "request_timeout_secs".to_string(),
            reason: format!("Invalid timeout: {}. Use a positive number of seconds", s),
        }),
    }
}

/// Parse a positive distance in meters
pub fn parse_meters(key: &str, s: &str) -> Result<f64> {
    let value = s.trim().parse::<f64>().map_err(|_| SarovarError::ConfigInvalid {
        key: key.to_string(),
        reason: format!("Invalid distance: {}. Use a number of meters", s),
    })?;
    validate_positive(key, value)
}

fn validate_positive(key: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SarovarError::ConfigInvalid {
            key: key.to_string(),
            reason: format!("{} must be a positive number", value),
        })
    }
}
