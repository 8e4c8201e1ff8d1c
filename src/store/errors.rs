//! Book store error types
//!
//! Error codes:
//! - BOOKS_STORE_NOT_FOUND: no document matches the id (expected outcome)
//! - BOOKS_STORE_UNAVAILABLE: connection closed, lock poisoned or timed out
//! - BOOKS_STORE_READ_FAILED: query or decode failure, including corruption
//! - BOOKS_STORE_WRITE_FAILED: insert, replace or delete failure

use std::io;

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by the document collections and the book store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No document with the given id
    #[error("Book with id '{0}' doesn't exist")]
    NotFound(String),

    /// The store cannot be reached
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A read or query failed
    #[error("Read failed: {0}")]
    ReadFailed(String),

    /// A write failed
    #[error("Write failed: {0}")]
    WriteFailed(String),
}

impl StoreError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::StoreUnavailable(msg.into())
    }

    pub fn read_failed(msg: impl Into<String>) -> Self {
        Self::ReadFailed(msg.into())
    }

    pub fn write_failed(msg: impl Into<String>) -> Self {
        Self::WriteFailed(msg.into())
    }

    /// Read failure wrapping an I/O error
    pub fn read_io(context: impl AsRef<str>, source: io::Error) -> Self {
        Self::ReadFailed(format!("{}: {}", context.as_ref(), source))
    }

    /// Write failure wrapping an I/O error
    pub fn write_io(context: impl AsRef<str>, source: io::Error) -> Self {
        Self::WriteFailed(format!("{}: {}", context.as_ref(), source))
    }

    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::NotFound(_) => "BOOKS_STORE_NOT_FOUND",
            StoreError::StoreUnavailable(_) => "BOOKS_STORE_UNAVAILABLE",
            StoreError::ReadFailed(_) => "BOOKS_STORE_READ_FAILED",
            StoreError::WriteFailed(_) => "BOOKS_STORE_WRITE_FAILED",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            StoreError::not_found("x"),
            StoreError::unavailable("x"),
            StoreError::read_failed("x"),
            StoreError::write_failed("x"),
        ];
        let codes: HashSet<&str> = errors.iter().map(|e| e.code()).collect();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_io_context_in_message() {
        let err = StoreError::write_io(
            "Failed to append record",
            io::Error::new(io::ErrorKind::Other, "disk full"),
        );
        assert_eq!(err.code(), "BOOKS_STORE_WRITE_FAILED");
        assert!(err.to_string().contains("disk full"));
        assert!(!err.is_not_found());
    }
}
