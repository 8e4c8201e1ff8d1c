//! Configuration file
//!
//! A single JSON document. Every field has a default, so `{}` is a valid
//! configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use super::errors::{CliError, CliResult};
use crate::http_server::HttpServerConfig;
use crate::store::StoreConfig;

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Host, port and CORS settings
    #[serde(flatten)]
    pub server: HttpServerConfig,

    /// Log filter directives, overridden by RUST_LOG (default: "info")
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Document store settings
    #[serde(default)]
    pub store: StoreConfig,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: HttpServerConfig::default(),
            log_filter: default_log_filter(),
            store: StoreConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CliError::config_error(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Write configuration as pretty JSON
    pub fn save(&self, path: &Path) -> CliResult<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| CliError::config_error(format!("Failed to encode config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> CliResult<()> {
        self.server.validate().map_err(CliError::config_error)?;

        if let Err(e) = EnvFilter::try_new(&self.log_filter) {
            return Err(CliError::config_error(format!(
                "Invalid log_filter '{}': {}",
                self.log_filter, e
            )));
        }

        self.store.validate().map_err(CliError::config_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreBackend;
    use tempfile::TempDir;

    #[test]
    fn test_empty_object_is_default() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.server.port, 7071);
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.store.backend, StoreBackend::File);
    }

    #[test]
    fn test_flat_server_fields() {
        let config: Config = serde_json::from_str(
            r#"{"port": 8080, "cors_origins": ["http://localhost:3000"], "store": {"backend": "memory"}}"#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.cors_origins.len(), 1);
        assert_eq!(config.store.backend, StoreBackend::Memory);
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("books.json");
        let mut config = Config::default();
        config.store.collection_name = "Novels".to_string();
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(&dir.path().join("absent.json")).unwrap_err();
        assert_eq!(err.code().code(), "BOOKS_CLI_CONFIG_ERROR");
    }

    #[test]
    fn test_load_rejects_invalid_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("books.json");
        fs::write(&path, r#"{"store": {"timeout_ms": 0}}"#).unwrap();
        assert!(Config::load(&path).is_err());

        fs::write(&path, r#"{"store": {"collection_name": "a/b"}}"#).unwrap();
        assert!(Config::load(&path).is_err());
    }
}
