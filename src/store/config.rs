//! Store Configuration
//!
//! Backend selection, location and naming of the book collection.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Document store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Volatile, process-local collections
    Memory,
    /// Append-only files under `data_dir`
    File,
    /// A MongoDB deployment reached through `connection_string`
    Mongo,
}

/// Store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend (default: file)
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,

    /// Root directory for the file backend (default: "./data")
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// MongoDB connection string, required by the mongo backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,

    /// Database name (default: "BookstoreDB")
    #[serde(default = "default_database_name")]
    pub database_name: String,

    /// Collection holding books (default: "Books")
    #[serde(default = "default_collection_name")]
    pub collection_name: String,

    /// Upper bound on each store call in milliseconds (default: 5000)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_backend() -> StoreBackend {
    StoreBackend::File
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_database_name() -> String {
    "BookstoreDB".to_string()
}

fn default_collection_name() -> String {
    "Books".to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            data_dir: default_data_dir(),
            connection_string: None,
            database_name: default_database_name(),
            collection_name: default_collection_name(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl StoreConfig {
    /// In-memory configuration, mostly for tests
    pub fn memory() -> Self {
        Self {
            backend: StoreBackend::Memory,
            ..Default::default()
        }
    }

    /// File configuration rooted at `data_dir`
    pub fn file(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend: StoreBackend::File,
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// MongoDB configuration for `connection_string`
    pub fn mongo(connection_string: impl Into<String>) -> Self {
        Self {
            backend: StoreBackend::Mongo,
            connection_string: Some(connection_string.into()),
            ..Default::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Directory holding this database's collection files
    pub fn database_dir(&self) -> PathBuf {
        self.data_dir.join(&self.database_name)
    }

    /// Check names and limits
    pub fn validate(&self) -> Result<(), String> {
        validate_name("database_name", &self.database_name)?;
        validate_name("collection_name", &self.collection_name)?;

        if self.timeout_ms == 0 {
            return Err("timeout_ms must be > 0".to_string());
        }

        if self.backend == StoreBackend::Mongo {
            let uri = self.connection_string.as_deref().unwrap_or("");
            if !uri.starts_with("mongodb://") && !uri.starts_with("mongodb+srv://") {
                return Err(
                    "mongo backend needs a mongodb:// or mongodb+srv:// connection_string"
                        .to_string(),
                );
            }
        }

        Ok(())
    }
}

/// Names become file and directory names, so they must be plain segments
pub(crate) fn validate_name(field: &str, name: &str) -> Result<(), String> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if invalid {
        return Err(format!("Invalid {}: '{}'", field, name));
    }
    Ok(())
}
