//! # Book Store
//!
//! CRUD access to the book collection, addressed by `id`.
//!
//! - Every identity lookup goes through [`Filter::by_id`].
//! - Update and Remove check existence first and write nothing when the
//!   book is absent.
//! - Every call is bounded by the configured timeout; expiry is reported as
//!   `StoreUnavailable`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use super::collection::{Document, DocumentCollection, Filter};
use super::database::Database;
use super::errors::{StoreError, StoreResult};
use crate::model::{Book, BookDraft, BookPatch};

/// Data access for books
#[derive(Clone)]
pub struct BookStore {
    collection: Arc<dyn DocumentCollection>,
    timeout: Duration,
}

impl BookStore {
    pub fn new(collection: Arc<dyn DocumentCollection>, timeout: Duration) -> Self {
        Self {
            collection,
            timeout,
        }
    }

    /// Build a store over the configured collection of `database`
    pub fn open(database: &Database) -> StoreResult<Self> {
        let config = database.config();
        let collection = database.collection(&config.collection_name)?;
        Ok(Self::new(collection, config.timeout()))
    }

    pub fn collection_name(&self) -> &str {
        self.collection.name()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Persist a new book under a freshly generated id
    ///
    /// A timeout does not cancel a write already handed to the backend, so
    /// `StoreUnavailable` from a timed-out create may still leave the book
    /// stored. Retrying then stores a second copy under a new id.
    pub async fn create(&self, draft: BookDraft) -> StoreResult<Book> {
        let book = draft.into_book();
        let doc = to_document(&book)?;
        self.bounded(self.collection.insert_one(doc)).await?;
        debug!(id = %book.id, "book created");
        Ok(book)
    }

    /// Fetch the book whose id equals `id`
    pub async fn get(&self, id: &str) -> StoreResult<Book> {
        self.find(id)
            .await?
            .ok_or_else(|| StoreError::not_found(id))
    }

    /// Every book, in store order
    pub async fn get_all(&self) -> StoreResult<Vec<Book>> {
        let docs = self.bounded(self.collection.find_all()).await?;
        docs.into_iter().map(from_document).collect()
    }

    /// Merge `patch` over the stored book and persist the result
    pub async fn update(&self, id: &str, patch: BookPatch) -> StoreResult<Book> {
        let existing = self
            .find(id)
            .await?
            .ok_or_else(|| StoreError::not_found(id))?;

        let updated = existing.apply(&patch);
        let doc = to_document(&updated)?;
        let matched = self
            .bounded(self.collection.replace_one(&Filter::by_id(id), doc))
            .await?;

        // Removed between the existence check and the replace
        if matched == 0 {
            return Err(StoreError::not_found(id));
        }
        debug!(id = %id, "book updated");
        Ok(updated)
    }

    /// Delete the book whose id equals `id`
    pub async fn remove(&self, id: &str) -> StoreResult<()> {
        if self.find(id).await?.is_none() {
            return Err(StoreError::not_found(id));
        }

        let deleted = self
            .bounded(self.collection.delete_one(&Filter::by_id(id)))
            .await?;
        if deleted == 0 {
            return Err(StoreError::not_found(id));
        }
        debug!(id = %id, "book removed");
        Ok(())
    }

    async fn find(&self, id: &str) -> StoreResult<Option<Book>> {
        let filter = Filter::by_id(id);
        self.bounded(self.collection.find_one(&filter))
            .await?
            .map(from_document)
            .transpose()
    }

    /// Give up waiting after the configured timeout. The underlying call
    /// may still complete.
    async fn bounded<T, F>(&self, op: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        tokio::time::timeout(self.timeout, op).await.map_err(|_| {
            StoreError::unavailable(format!(
                "Store call on '{}' timed out after {:?}",
                self.collection.name(),
                self.timeout
            ))
        })?
    }
}

fn to_document(book: &Book) -> StoreResult<Document> {
    match serde_json::to_value(book) {
        Ok(Value::Object(doc)) => Ok(doc),
        Ok(_) => Err(StoreError::write_failed("Book did not encode to an object")),
        Err(e) => Err(StoreError::write_failed(format!(
            "Failed to encode book: {}",
            e
        ))),
    }
}

fn from_document(doc: Document) -> StoreResult<Book> {
    serde_json::from_value(Value::Object(doc))
        .map_err(|e| StoreError::read_failed(format!("Stored document is not a book: {}", e)))
}
