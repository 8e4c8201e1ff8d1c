//! Book entity and its request payloads

use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::errors::{ModelError, ModelResult};
use super::price::Price;

/// A persisted book
///
/// Serializes to the stored document shape:
/// `{"id", "name", "price", "category", "author"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub name: String,
    pub price: Price,
    pub category: String,
    pub author: String,
}

/// Create payload. Carries no id; one is assigned on insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDraft {
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub author: String,
}

/// Update payload. Unset fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl BookDraft {
    pub fn new(
        name: impl Into<String>,
        price: Price,
        category: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            price,
            category: category.into(),
            author: author.into(),
        }
    }

    /// Reject drafts without a title
    pub fn validate(&self) -> ModelResult<()> {
        if self.name.trim().is_empty() {
            return Err(ModelError::MissingField("name"));
        }
        Ok(())
    }

    /// Assign a fresh identifier
    pub fn into_book(self) -> Book {
        Book {
            id: ObjectId::new().to_hex(),
            name: self.name,
            price: self.price,
            category: self.category,
            author: self.author,
        }
    }
}

impl BookPatch {
    /// Reject a supplied but blank title
    pub fn validate(&self) -> ModelResult<()> {
        match &self.name {
            Some(name) if name.trim().is_empty() => Err(ModelError::MissingField("name")),
            _ => Ok(()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price.is_none()
            && self.category.is_none()
            && self.author.is_none()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_price(mut self, price: Price) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}

impl Book {
    /// Merge a patch over this book. Supplied fields overwrite, the id never
    /// changes.
    pub fn apply(&self, patch: &BookPatch) -> Book {
        Book {
            id: self.id.clone(),
            name: patch.name.clone().unwrap_or_else(|| self.name.clone()),
            price: patch.price.unwrap_or(self.price),
            category: patch
                .category
                .clone()
                .unwrap_or_else(|| self.category.clone()),
            author: patch.author.clone().unwrap_or_else(|| self.author.clone()),
        }
    }
}
