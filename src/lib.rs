//! books-api - CRUD over a document-backed book catalogue
//!
//! - `model`: the book entity, its draft and patch payloads, ids and prices
//! - `store`: document collections (memory and file) and the book store
//! - `http_server`: axum handlers, error mapping and server lifecycle
//! - `cli`: `init` and `serve` commands

pub mod cli;
pub mod http_server;
pub mod model;
pub mod store;
