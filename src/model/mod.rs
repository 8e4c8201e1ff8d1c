//! # Entity Model
//!
//! The canonical shape of a Book record, the payloads used to create and
//! patch one, and the identifier scheme.

mod book;
mod errors;
mod price;

pub use book::{Book, BookDraft, BookPatch};
pub use errors::{ModelError, ModelResult};
pub use mongodb::bson::oid::ObjectId;
pub use price::Price;
