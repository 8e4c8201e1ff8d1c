//! In-memory document collection
//!
//! Documents live in insertion order behind a read/write lock. Used for
//! tests and for the `memory` backend.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use super::collection::{document_id, ConnectionState, Document, DocumentCollection, Filter};
use super::errors::{StoreError, StoreResult};

/// Collection held entirely in memory
pub struct MemoryCollection {
    name: String,
    documents: RwLock<Vec<Document>>,
    connection: Arc<ConnectionState>,
}

impl MemoryCollection {
    /// Create an empty collection with its own connection state
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_connection(name, ConnectionState::new())
    }

    pub(crate) fn with_connection(name: impl Into<String>, connection: Arc<ConnectionState>) -> Self {
        Self {
            name: name.into(),
            documents: RwLock::new(Vec::new()),
            connection,
        }
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Vec<Document>>> {
        self.connection.ensure_open()?;
        self.documents
            .read()
            .map_err(|_| StoreError::unavailable("Collection lock poisoned"))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Vec<Document>>> {
        self.connection.ensure_open()?;
        self.documents
            .write()
            .map_err(|_| StoreError::unavailable("Collection lock poisoned"))
    }
}

#[async_trait]
impl DocumentCollection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn insert_one(&self, doc: Document) -> StoreResult<()> {
        let id = document_id(&doc)?.to_string();
        let mut documents = self.write()?;
        let filter = Filter::by_id(&id);
        if documents.iter().any(|existing| filter.matches(existing)) {
            return Err(StoreError::write_failed(format!(
                "Duplicate id '{}' in collection '{}'",
                id, self.name
            )));
        }
        documents.push(doc);
        Ok(())
    }

    async fn find_one(&self, filter: &Filter) -> StoreResult<Option<Document>> {
        let documents = self.read()?;
        Ok(documents.iter().find(|doc| filter.matches(doc)).cloned())
    }

    async fn find_all(&self) -> StoreResult<Vec<Document>> {
        Ok(self.read()?.clone())
    }

    async fn replace_one(&self, filter: &Filter, doc: Document) -> StoreResult<u64> {
        let mut documents = self.write()?;
        match documents.iter_mut().find(|existing| filter.matches(existing)) {
            Some(existing) => {
                *existing = doc;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_one(&self, filter: &Filter) -> StoreResult<u64> {
        let mut documents = self.write()?;
        match documents.iter().position(|existing| filter.matches(existing)) {
            Some(pos) => {
                documents.remove(pos);
                Ok(1)
            }
            None => Ok(0),
        }
    }
}
