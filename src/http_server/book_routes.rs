//! Book HTTP Routes
//!
//! | Method | Path         | Success                |
//! |--------|--------------|------------------------|
//! | POST   | `/Book`      | 201 + created book     |
//! | GET    | `/Books`     | 200 + array of books   |
//! | GET    | `/Book/:id`  | 200 + book             |
//! | PUT    | `/Book/:id`  | 202 + updated book     |
//! | DELETE | `/Book/:id`  | 204                    |
//!
//! Each handler makes exactly one book store call. Missing ids come back
//! from the store as `NotFound` before any write, and map to 404.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::info;

use super::errors::ApiResult;
use crate::model::{Book, BookDraft, BookPatch};
use crate::store::BookStore;

// ==================
// Shared State
// ==================

/// Book state shared across handlers
pub struct BookState {
    pub store: BookStore,
}

impl BookState {
    pub fn new(store: BookStore) -> Self {
        Self { store }
    }
}

// ==================
// Book Routes
// ==================

/// Create book routes
pub fn book_routes(state: Arc<BookState>) -> Router {
    Router::new()
        .route("/Books", get(get_all_books_handler))
        .route("/Book", post(create_book_handler))
        .route(
            "/Book/:id",
            get(get_book_by_id_handler)
                .put(update_book_handler)
                .delete(delete_book_handler),
        )
        .with_state(state)
}

// ==================
// Handlers
// ==================

async fn create_book_handler(
    State(state): State<Arc<BookState>>,
    payload: Result<Json<BookDraft>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Book>)> {
    let Json(draft) = payload?;
    draft.validate()?;

    let book = state.store.create(draft).await?;
    info!(id = %book.id, "created book");
    Ok((StatusCode::CREATED, Json(book)))
}

async fn get_all_books_handler(
    State(state): State<Arc<BookState>>,
) -> ApiResult<Json<Vec<Book>>> {
    let books = state.store.get_all().await?;
    Ok(Json(books))
}

async fn get_book_by_id_handler(
    State(state): State<Arc<BookState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Book>> {
    let book = state.store.get(&id).await?;
    Ok(Json(book))
}

async fn update_book_handler(
    State(state): State<Arc<BookState>>,
    Path(id): Path<String>,
    payload: Result<Json<BookPatch>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Book>)> {
    let Json(patch) = payload?;
    patch.validate()?;

    let book = state.store.update(&id, patch).await?;
    info!(id = %book.id, "updated book");
    Ok((StatusCode::ACCEPTED, Json(book)))
}

async fn delete_book_handler(
    State(state): State<Arc<BookState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.store.remove(&id).await?;
    info!(id = %id, "deleted book");
    Ok(StatusCode::NO_CONTENT)
}
