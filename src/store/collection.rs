//! Document collection abstraction
//!
//! A collection holds JSON object documents and exposes the single-document
//! primitives the book store is written against. Every identity-based call
//! goes through an explicit [`Filter`]; backends never infer a match.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::errors::{StoreError, StoreResult};

/// A stored document
pub type Document = Map<String, Value>;

/// Name of the identity field on every document
pub const ID_FIELD: &str = "id";

/// Equality filter on a single top-level field
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    field: String,
    value: Value,
}

impl Filter {
    pub fn field_eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Match the document whose `id` equals `id` exactly
    pub fn by_id(id: &str) -> Self {
        Self::field_eq(ID_FIELD, id)
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Returns true when the document carries the field with an equal value.
    /// Documents missing the field never match.
    pub fn matches(&self, doc: &Document) -> bool {
        doc.get(&self.field) == Some(&self.value)
    }
}

/// Read the id of a document
pub fn document_id(doc: &Document) -> StoreResult<&str> {
    doc.get(ID_FIELD)
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::write_failed("Document has no string 'id' field"))
}

/// Shared open/closed state for every collection opened from one database
#[derive(Debug, Default)]
pub struct ConnectionState {
    closed: AtomicBool,
}

impl ConnectionState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_open(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }

    /// Fail with `StoreUnavailable` once the connection has been closed
    pub fn ensure_open(&self) -> StoreResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(StoreError::unavailable("Database connection is closed"))
        }
    }
}

/// Single-document operations over a collection
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    /// Collection name
    fn name(&self) -> &str;

    /// Insert a new document. Fails with `WriteFailed` if the id is taken.
    async fn insert_one(&self, doc: Document) -> StoreResult<()>;

    /// First document matching the filter
    async fn find_one(&self, filter: &Filter) -> StoreResult<Option<Document>>;

    /// Every document, in insertion order
    async fn find_all(&self) -> StoreResult<Vec<Document>>;

    /// Replace the first matching document. Returns the number matched.
    async fn replace_one(&self, filter: &Filter, doc: Document) -> StoreResult<u64>;

    /// Delete the first matching document. Returns the number deleted.
    async fn delete_one(&self, filter: &Filter) -> StoreResult<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_filter_matches_exact_id() {
        let filter = Filter::by_id("abc");
        assert!(filter.matches(&doc(json!({"id": "abc"}))));
        assert!(!filter.matches(&doc(json!({"id": "abcd"}))));
        assert!(!filter.matches(&doc(json!({"id": "ABC"}))));
        assert!(!filter.matches(&doc(json!({"name": "abc"}))));
    }

    #[test]
    fn test_filter_is_type_strict() {
        let filter = Filter::field_eq("count", 1);
        assert!(filter.matches(&doc(json!({"count": 1}))));
        assert!(!filter.matches(&doc(json!({"count": "1"}))));
    }

    #[test]
    fn test_document_id_requires_string() {
        assert_eq!(document_id(&doc(json!({"id": "x"}))).unwrap(), "x");
        assert!(document_id(&doc(json!({"id": 5}))).is_err());
        assert!(document_id(&doc(json!({}))).is_err());
    }

    #[test]
    fn test_connection_close() {
        let state = ConnectionState::new();
        assert!(state.ensure_open().is_ok());
        state.close();
        assert!(matches!(
            state.ensure_open(),
            Err(StoreError::StoreUnavailable(_))
        ));
    }
}
