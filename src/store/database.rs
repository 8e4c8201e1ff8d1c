//! Database handle
//!
//! Explicitly constructed from a [`StoreConfig`] and passed to whoever needs
//! collections. Closing the handle makes every collection opened from it
//! report `StoreUnavailable`.

use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, Mutex};

use tracing::info;

use super::collection::{ConnectionState, DocumentCollection};
use super::config::{validate_name, StoreBackend, StoreConfig};
use super::errors::{StoreError, StoreResult};
use super::file::FileCollection;
use super::memory::MemoryCollection;
use super::mongo::MongoCollection;

/// An open database
pub struct Database {
    config: StoreConfig,
    connection: Arc<ConnectionState>,
    collections: Mutex<HashMap<String, Arc<dyn DocumentCollection>>>,
}

impl Database {
    /// Open the database described by `config`
    ///
    /// # Errors
    ///
    /// `StoreUnavailable` if the configuration is invalid, `WriteFailed` if
    /// the file backend's directory cannot be created.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        config.validate().map_err(StoreError::unavailable)?;

        if config.backend == StoreBackend::File {
            let dir = config.database_dir();
            fs::create_dir_all(&dir).map_err(|e| {
                StoreError::write_io(format!("Failed to create {}", dir.display()), e)
            })?;
        }

        info!(
            backend = ?config.backend,
            database = %config.database_name,
            "database opened"
        );

        Ok(Self {
            config: config.clone(),
            connection: ConnectionState::new(),
            collections: Mutex::new(HashMap::new()),
        })
    }

    /// Volatile database with default names
    pub fn in_memory() -> Self {
        Self {
            config: StoreConfig::memory(),
            connection: ConnectionState::new(),
            collections: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.database_name
    }

    /// Get a collection, opening it on first use
    pub fn collection(&self, name: &str) -> StoreResult<Arc<dyn DocumentCollection>> {
        self.connection.ensure_open()?;
        validate_name("collection name", name).map_err(StoreError::unavailable)?;

        let mut collections = self
            .collections
            .lock()
            .map_err(|_| StoreError::unavailable("Database lock poisoned"))?;

        if let Some(existing) = collections.get(name) {
            return Ok(Arc::clone(existing));
        }

        let collection: Arc<dyn DocumentCollection> = match self.config.backend {
            StoreBackend::Memory => Arc::new(MemoryCollection::with_connection(
                name,
                Arc::clone(&self.connection),
            )),
            StoreBackend::File => {
                let path = self.config.database_dir().join(format!("{}.dat", name));
                Arc::new(FileCollection::open(
                    name,
                    path,
                    Arc::clone(&self.connection),
                )?)
            }
            StoreBackend::Mongo => {
                let uri = self.config.connection_string.as_deref().ok_or_else(|| {
                    StoreError::unavailable("mongo backend has no connection_string")
                })?;
                Arc::new(MongoCollection::new(
                    name,
                    uri,
                    &self.config.database_name,
                    Arc::clone(&self.connection),
                ))
            }
        };

        collections.insert(name.to_string(), Arc::clone(&collection));
        Ok(collection)
    }

    /// Close the connection. Collections already handed out stop serving.
    pub fn close(&self) {
        if self.connection.is_open() {
            self.connection.close();
            info!(database = %self.config.database_name, "database closed");
        }
    }

    pub fn is_open(&self) -> bool {
        self.connection.is_open()
    }
}
