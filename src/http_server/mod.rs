//! # HTTP Server Module
//!
//! Thin request/response adapters over the book store.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/api/Books`, `/api/Book`, `/api/Book/:id` - Book CRUD

pub mod book_routes;
pub mod config;
pub mod errors;
pub mod health_routes;
pub mod server;

pub use config::HttpServerConfig;
pub use errors::{ApiError, ApiResult};
pub use server::HttpServer;
