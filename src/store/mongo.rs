//! MongoDB-backed document collection
//!
//! Talks to a MongoDB (or Cosmos DB Mongo API) deployment through the
//! official driver. The client is created on first use; a unique index on
//! `id` backs the duplicate-id rule of [`DocumentCollection::insert_one`].
//!
//! Driver errors that mean the server cannot be reached (server selection,
//! network I/O, DNS, pool cleared) map to `StoreUnavailable`. Anything else
//! is a read or write failure depending on the call.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{self, Document as BsonDocument};
use mongodb::error::{Error as MongoError, ErrorKind};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, IndexModel};
use tokio::sync::OnceCell;
use tracing::info;

use super::collection::{ConnectionState, Document, DocumentCollection, Filter, ID_FIELD};
use super::errors::{StoreError, StoreResult};

/// Field MongoDB adds to every stored document
const MONGO_ID_FIELD: &str = "_id";

/// Collection stored in a MongoDB database
pub struct MongoCollection {
    name: String,
    uri: String,
    database: String,
    collection: OnceCell<Collection<BsonDocument>>,
    connection: Arc<ConnectionState>,
}

impl MongoCollection {
    /// Describe a collection. No connection is made until the first call.
    pub fn new(
        name: impl Into<String>,
        uri: impl Into<String>,
        database: impl Into<String>,
        connection: Arc<ConnectionState>,
    ) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
            database: database.into(),
            collection: OnceCell::new(),
            connection,
        }
    }

    async fn handle(&self) -> StoreResult<&Collection<BsonDocument>> {
        self.connection.ensure_open()?;
        self.collection.get_or_try_init(|| self.connect()).await
    }

    async fn connect(&self) -> StoreResult<Collection<BsonDocument>> {
        let client = Client::with_uri_str(&self.uri).await.map_err(|e| {
            StoreError::unavailable(format!(
                "Failed to create client for database '{}': {}",
                self.database, e
            ))
        })?;
        let collection = client
            .database(&self.database)
            .collection::<BsonDocument>(&self.name);

        let mut keys = BsonDocument::new();
        keys.insert(ID_FIELD, 1);
        let index = IndexModel::builder()
            .keys(keys)
            .options(IndexOptions::builder().unique(true).build())
            .build();
        collection
            .create_index(index, None)
            .await
            .map_err(|e| classify(e, StoreError::WriteFailed))?;

        info!(
            database = %self.database,
            collection = %self.name,
            "mongo collection ready"
        );
        Ok(collection)
    }
}

/// Map a driver error, keeping unreachable-server errors distinct
fn classify(e: MongoError, otherwise: fn(String) -> StoreError) -> StoreError {
    match e.kind.as_ref() {
        ErrorKind::ServerSelection { .. }
        | ErrorKind::Io(_)
        | ErrorKind::DnsResolve { .. }
        | ErrorKind::ConnectionPoolCleared { .. } => StoreError::unavailable(e.to_string()),
        _ => otherwise(e.to_string()),
    }
}

fn to_bson_filter(filter: &Filter) -> StoreResult<BsonDocument> {
    let value = bson::to_bson(filter.value())
        .map_err(|e| StoreError::read_failed(format!("Unsupported filter value: {}", e)))?;
    let mut query = BsonDocument::new();
    query.insert(filter.field(), value);
    Ok(query)
}

fn to_bson_document(doc: &Document) -> StoreResult<BsonDocument> {
    bson::to_document(doc)
        .map_err(|e| StoreError::write_failed(format!("Failed to encode document: {}", e)))
}

fn from_bson_document(mut doc: BsonDocument) -> StoreResult<Document> {
    doc.remove(MONGO_ID_FIELD);
    bson::from_document(doc)
        .map_err(|e| StoreError::read_failed(format!("Failed to decode document: {}", e)))
}

#[async_trait]
impl DocumentCollection for MongoCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn insert_one(&self, doc: Document) -> StoreResult<()> {
        let doc = to_bson_document(&doc)?;
        self.handle()
            .await?
            .insert_one(doc, None)
            .await
            .map_err(|e| classify(e, StoreError::WriteFailed))?;
        Ok(())
    }

    async fn find_one(&self, filter: &Filter) -> StoreResult<Option<Document>> {
        let query = to_bson_filter(filter)?;
        self.handle()
            .await?
            .find_one(query, None)
            .await
            .map_err(|e| classify(e, StoreError::ReadFailed))?
            .map(from_bson_document)
            .transpose()
    }

    async fn find_all(&self) -> StoreResult<Vec<Document>> {
        let cursor = self
            .handle()
            .await?
            .find(None, None)
            .await
            .map_err(|e| classify(e, StoreError::ReadFailed))?;
        let docs: Vec<BsonDocument> = cursor
            .try_collect()
            .await
            .map_err(|e| classify(e, StoreError::ReadFailed))?;
        docs.into_iter().map(from_bson_document).collect()
    }

    async fn replace_one(&self, filter: &Filter, doc: Document) -> StoreResult<u64> {
        let query = to_bson_filter(filter)?;
        let doc = to_bson_document(&doc)?;
        let result = self
            .handle()
            .await?
            .replace_one(query, doc, None)
            .await
            .map_err(|e| classify(e, StoreError::WriteFailed))?;
        Ok(result.matched_count)
    }

    async fn delete_one(&self, filter: &Filter) -> StoreResult<u64> {
        let query = to_bson_filter(filter)?;
        let result = self
            .handle()
            .await?
            .delete_one(query, None)
            .await
            .map_err(|e| classify(e, StoreError::WriteFailed))?;
        Ok(result.deleted_count)
    }
}
