use std::env;
use std::path::PathBuf;

use sarovar_core::config::LayeredConfig;

/// Which compute backend the server talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Scripted in-memory backend loaded from a fixture.
    #[default]
    Memory,
    /// Remote compute service at `backend_endpoint`.
    Http,
}

impl BackendKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "mem" | "demo" => Some(Self::Memory),
            "http" | "remote" => Some(Self::Http),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Http => "http",
        }
    }
}

/// API server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub port: u16,
    pub cors_origin: String,
    pub backend: BackendKind,
    /// Fixture for the memory backend; the bundled demo when unset.
    pub fixture: Option<PathBuf>,
    /// Shared settings (endpoint, project, export folder, ...).
    pub layered: LayeredConfig,
}

impl ApiConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let port = env::var("SAROVAR_PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(3001);

        let cors_origin =
            env::var("SAROVAR_CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());

        let backend = match env::var("SAROVAR_BACKEND") {
            Ok(value) => BackendKind::parse(&value).unwrap_or_else(|| {
                tracing::warn!("Invalid SAROVAR_BACKEND value '{}': expected memory or http", value);
                BackendKind::default()
            }),
            Err(_) => BackendKind::default(),
        };

        let fixture = env::var("SAROVAR_FIXTURE").ok().filter(|p| !p.is_empty()).map(PathBuf::from);

        Self { port, cors_origin, backend, fixture, layered: LayeredConfig::with_defaults().load_from_env() }
    }

    /// Get the server bind address
    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in ["SAROVAR_PORT", "SAROVAR_CORS_ORIGIN", "SAROVAR_BACKEND", "SAROVAR_FIXTURE"] {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = ApiConfig::from_env();
        assert_eq!(config.port, 3001);
        assert_eq!(config.cors_origin, "http://localhost:3000");
        assert_eq!(config.backend, BackendKind::Memory);
        assert!(config.fixture.is_none());
        assert_eq!(config.bind_address(), "0.0.0.0:3001");
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        env::set_var("SAROVAR_PORT", "8080");
        env::set_var("SAROVAR_BACKEND", "HTTP");
        env::set_var("SAROVAR_FIXTURE", "/tmp/fixture.toml");

        let config = ApiConfig::from_env();
        assert_eq!(config.port, 8080);
        assert_eq!(config.backend, BackendKind::Http);
        assert_eq!(config.fixture, Some(PathBuf::from("/tmp/fixture.toml")));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_values_fall_back() {
        clear_env();
        env::set_var("SAROVAR_PORT", "not-a-port");
        env::set_var("SAROVAR_BACKEND", "carrier-pigeon");

        let config = ApiConfig::from_env();
        assert_eq!(config.port, 3001);
        assert_eq!(config.backend, BackendKind::Memory);
        clear_env();
    }
}
