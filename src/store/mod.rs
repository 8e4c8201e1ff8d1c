//! # Book Store Module
//!
//! Document collections and the CRUD component built on them.
//!
//! ```text
//! BookStore ──► DocumentCollection ──┬─► MemoryCollection
//!                    ▲               ├─► FileCollection (append-only, CRC32)
//!                    │               └─► MongoCollection (official driver)
//!                    │
//!                Database (opened from StoreConfig, closed on shutdown)
//! ```

pub mod book_store;
pub mod collection;
pub mod config;
pub mod database;
pub mod errors;
pub mod file;
pub mod memory;
pub mod mongo;
mod record;

pub use book_store::BookStore;
pub use collection::{Document, DocumentCollection, Filter};
pub use config::{StoreBackend, StoreConfig};
pub use database::Database;
pub use errors::{StoreError, StoreResult};
pub use file::FileCollection;
pub use memory::MemoryCollection;
pub use mongo::MongoCollection;
