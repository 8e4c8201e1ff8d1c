//! Entity model errors

use thiserror::Error;

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while building or validating entity payloads
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A required field is missing or blank
    #[error("Field '{0}' is required")]
    MissingField(&'static str),

    /// Price is negative or not a decimal number
    #[error("Invalid price: {0}")]
    InvalidPrice(String),
}

impl ModelError {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            ModelError::MissingField(_) => "BOOKS_MODEL_MISSING_FIELD",
            ModelError::InvalidPrice(_) => "BOOKS_MODEL_INVALID_PRICE",
        }
    }
}
