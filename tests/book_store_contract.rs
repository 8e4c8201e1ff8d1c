//! Book Store Contract Tests
//!
//! Every check runs against both the memory and the file backend:
//! - Create then Get returns an equal book
//! - Absent ids are NotFound for Get, Update and Remove
//! - Update merges supplied fields and keeps the id
//! - Identity matching never touches other documents

use books_api::model::{Book, BookDraft, BookPatch, ObjectId, Price};
use books_api::store::{BookStore, Database, StoreConfig, StoreError};
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

/// Keeps the database (and temp dir, for files) alive for the test
struct Fixture {
    _dir: Option<TempDir>,
    database: Database,
    store: BookStore,
}

fn memory_fixture() -> Fixture {
    let database = Database::open(&StoreConfig::memory()).unwrap();
    let store = BookStore::open(&database).unwrap();
    Fixture {
        _dir: None,
        database,
        store,
    }
}

fn file_fixture() -> Fixture {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let database = Database::open(&StoreConfig::file(dir.path())).unwrap();
    let store = BookStore::open(&database).unwrap();
    Fixture {
        _dir: Some(dir),
        database,
        store,
    }
}

fn price(s: &str) -> Price {
    s.parse().unwrap()
}

fn dune() -> BookDraft {
    BookDraft::new("Dune", price("12.50"), "SciFi", "Herbert")
}

async fn seed(store: &BookStore) -> Vec<Book> {
    let mut books = Vec::new();
    for (name, author) in [
        ("Emma", "Austen"),
        ("Ulysses", "Joyce"),
        ("Beloved", "Morrison"),
    ] {
        let draft = BookDraft::new(name, price("8.00"), "Fiction", author);
        books.push(store.create(draft).await.unwrap());
    }
    books
}

macro_rules! on_both_backends {
    ($($name:ident),* $(,)?) => {
        mod memory {
            $(
                #[tokio::test]
                async fn $name() {
                    super::$name(super::memory_fixture()).await;
                }
            )*
        }

        mod file {
            $(
                #[tokio::test]
                async fn $name() {
                    super::$name(super::file_fixture()).await;
                }
            )*
        }
    };
}

on_both_backends!(
    create_then_get,
    create_assigns_object_ids,
    large_price_reads_back_exactly,
    absent_id_is_not_found,
    removed_id_is_not_found,
    update_preserves_omitted_fields,
    update_is_idempotent,
    update_only_touches_matching_document,
    remove_only_touches_matching_document,
    get_all_empty,
    get_all_returns_every_book,
    dune_scenario,
    closed_database_is_unavailable,
);

// =============================================================================
// Create / Get
// =============================================================================

async fn create_then_get(fx: Fixture) {
    let created = fx.store.create(dune()).await.unwrap();
    assert_eq!(created.name, "Dune");
    assert_eq!(created.price, price("12.50"));

    let fetched = fx.store.get(&created.id).await.unwrap();
    assert_eq!(fetched, created);
}

async fn create_assigns_object_ids(fx: Fixture) {
    let a = fx.store.create(dune()).await.unwrap();
    let b = fx.store.create(dune()).await.unwrap();

    assert_ne!(a.id, b.id);
    assert!(ObjectId::parse_str(&a.id).is_ok());
    assert!(ObjectId::parse_str(&b.id).is_ok());
}

async fn large_price_reads_back_exactly(fx: Fixture) {
    for amount in ["999999999999.9999", "1000000000000.0001", "0.0001"] {
        let draft = BookDraft::new("Folio", price(amount), "Rare", "Anon");
        let created = fx.store.create(draft).await.unwrap();
        let fetched = fx.store.get(&created.id).await.unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.price.to_string(), amount);
    }
}

// =============================================================================
// NotFound
// =============================================================================

async fn absent_id_is_not_found(fx: Fixture) {
    seed(&fx.store).await;
    let missing = ObjectId::new().to_hex();

    assert!(fx.store.get(&missing).await.unwrap_err().is_not_found());
    assert!(fx
        .store
        .update(&missing, BookPatch::default().with_name("X"))
        .await
        .unwrap_err()
        .is_not_found());
    assert!(fx.store.remove(&missing).await.unwrap_err().is_not_found());

    // Nothing was written by the failed calls
    assert_eq!(fx.store.get_all().await.unwrap().len(), 3);
}

async fn removed_id_is_not_found(fx: Fixture) {
    let book = fx.store.create(dune()).await.unwrap();
    fx.store.remove(&book.id).await.unwrap();

    assert_eq!(
        fx.store.get(&book.id).await,
        Err(StoreError::not_found(book.id.clone()))
    );
    assert!(fx.store.remove(&book.id).await.unwrap_err().is_not_found());
    assert!(fx
        .store
        .update(&book.id, BookPatch::default().with_author("X"))
        .await
        .unwrap_err()
        .is_not_found());
}

// =============================================================================
// Update
// =============================================================================

async fn update_preserves_omitted_fields(fx: Fixture) {
    let book = fx.store.create(dune()).await.unwrap();
    let patch = BookPatch::default()
        .with_name("Dune Messiah")
        .with_price(price("14.00"));

    let updated = fx.store.update(&book.id, patch).await.unwrap();
    assert_eq!(updated.id, book.id);
    assert_eq!(updated.name, "Dune Messiah");
    assert_eq!(updated.price, price("14.00"));
    assert_eq!(updated.category, "SciFi");
    assert_eq!(updated.author, "Herbert");

    assert_eq!(fx.store.get(&book.id).await.unwrap(), updated);
}

async fn update_is_idempotent(fx: Fixture) {
    let book = fx.store.create(dune()).await.unwrap();
    let patch = BookPatch::default().with_category("Classic");

    let first = fx.store.update(&book.id, patch.clone()).await.unwrap();
    let second = fx.store.update(&book.id, patch).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(fx.store.get(&book.id).await.unwrap(), second);
}

async fn update_only_touches_matching_document(fx: Fixture) {
    let books = seed(&fx.store).await;
    let target = &books[1];

    fx.store
        .update(&target.id, BookPatch::default().with_author("Someone Else"))
        .await
        .unwrap();

    for book in &books {
        let stored = fx.store.get(&book.id).await.unwrap();
        if book.id == target.id {
            assert_eq!(stored.author, "Someone Else");
        } else {
            assert_eq!(&stored, book);
        }
    }
}

// =============================================================================
// Remove
// =============================================================================

async fn remove_only_touches_matching_document(fx: Fixture) {
    let books = seed(&fx.store).await;

    fx.store.remove(&books[2].id).await.unwrap();

    let remaining = fx.store.get_all().await.unwrap();
    assert_eq!(remaining.len(), 2);
    assert!(remaining.contains(&books[0]));
    assert!(remaining.contains(&books[1]));
    assert!(fx.store.get(&books[2].id).await.unwrap_err().is_not_found());
}

// =============================================================================
// GetAll
// =============================================================================

async fn get_all_empty(fx: Fixture) {
    assert!(fx.store.get_all().await.unwrap().is_empty());
}

async fn get_all_returns_every_book(fx: Fixture) {
    let books = seed(&fx.store).await;
    let all = fx.store.get_all().await.unwrap();

    assert_eq!(all.len(), books.len());
    for book in &books {
        assert!(all.contains(book));
    }
}

// =============================================================================
// Scenario
// =============================================================================

async fn dune_scenario(fx: Fixture) {
    let created = fx.store.create(dune()).await.unwrap();
    assert_eq!(created.price.to_string(), "12.50");

    assert_eq!(fx.store.get(&created.id).await.unwrap(), created);

    let updated = fx
        .store
        .update(&created.id, BookPatch::default().with_price(price("9.99")))
        .await
        .unwrap();
    assert_eq!(updated.price, price("9.99"));
    assert_eq!(updated.name, "Dune");
    assert_eq!(updated.category, "SciFi");
    assert_eq!(updated.author, "Herbert");

    fx.store.remove(&created.id).await.unwrap();
    assert!(fx.store.get(&created.id).await.unwrap_err().is_not_found());
}

// =============================================================================
// Connection
// =============================================================================

async fn closed_database_is_unavailable(fx: Fixture) {
    let book = fx.store.create(dune()).await.unwrap();
    fx.database.close();

    assert!(matches!(
        fx.store.get(&book.id).await,
        Err(StoreError::StoreUnavailable(_))
    ));
    assert!(matches!(
        fx.store.create(dune()).await,
        Err(StoreError::StoreUnavailable(_))
    ));
    assert!(matches!(
        fx.store.remove(&book.id).await,
        Err(StoreError::StoreUnavailable(_))
    ));
}
