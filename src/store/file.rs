//! Append-only file-backed document collection
//!
//! Each collection is one file of checksummed [`DocumentRecord`]s. Inserts
//! and replacements append a live record, deletes append a tombstone. The
//! file is replayed on open (latest record per id wins) into an in-memory
//! view, and every write is synced to disk before the view changes.
//!
//! File I/O runs on the blocking thread pool.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tracing::error;

use super::collection::{document_id, ConnectionState, Document, DocumentCollection, Filter};
use super::errors::{StoreError, StoreResult};
use super::record::DocumentRecord;

/// Collection persisted to a single append-only file
pub struct FileCollection {
    name: String,
    path: PathBuf,
    state: Arc<Mutex<FileState>>,
    connection: Arc<ConnectionState>,
}

struct FileState {
    path: PathBuf,
    file: File,
    len: u64,
    documents: Vec<Document>,
    /// Set when a torn append could not be truncated away
    failed: Option<String>,
}

impl FileState {
    /// Append a record and sync it. A failed append is truncated away so the
    /// file never ends in a torn record. If the truncation fails too, the
    /// collection refuses further writes.
    fn append(&mut self, record: &DocumentRecord) -> StoreResult<()> {
        if let Some(reason) = &self.failed {
            return Err(StoreError::unavailable(format!(
                "{} no longer accepts writes: {}",
                self.path.display(),
                reason
            )));
        }

        let bytes = record.serialize();

        let written = self
            .file
            .write_all(&bytes)
            .and_then(|_| self.file.sync_data());

        if let Err(e) = written {
            let context = format!(
                "Failed to append record for '{}' to {}",
                record.document_id,
                self.path.display()
            );
            if let Err(truncate) = self.file.set_len(self.len) {
                let reason = format!(
                    "{}: {}; truncating back to {} bytes failed: {}",
                    context, e, self.len, truncate
                );
                error!(path = %self.path.display(), "{}", reason);
                self.failed = Some(reason.clone());
                return Err(StoreError::write_failed(reason));
            }
            return Err(StoreError::write_io(context, e));
        }

        self.len += bytes.len() as u64;
        Ok(())
    }

    fn position(&self, filter: &Filter) -> Option<usize> {
        self.documents.iter().position(|doc| filter.matches(doc))
    }

    fn encode(doc: &Document) -> StoreResult<Vec<u8>> {
        serde_json::to_vec(doc)
            .map_err(|e| StoreError::write_failed(format!("Failed to encode document: {}", e)))
    }
}

impl FileCollection {
    /// Open or create the collection file at `path`, replaying existing
    /// records.
    ///
    /// # Errors
    ///
    /// `WriteFailed` if the file or its directory cannot be created,
    /// `ReadFailed` if an existing record is truncated, fails its checksum,
    /// or does not hold a JSON object.
    pub fn open(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        connection: Arc<ConnectionState>,
    ) -> StoreResult<Self> {
        let name = name.into();
        let path = path.into();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                StoreError::write_io(
                    format!("Failed to create directory {}", parent.display()),
                    e,
                )
            })?;
        }

        let documents = Self::replay(&path)?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                StoreError::write_io(format!("Failed to open {}", path.display()), e)
            })?;
        let len = file
            .metadata()
            .map_err(|e| StoreError::read_io("Failed to read file metadata", e))?
            .len();

        Ok(Self {
            name,
            path: path.clone(),
            state: Arc::new(Mutex::new(FileState {
                path,
                file,
                len,
                documents,
                failed: None,
            })),
            connection,
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn replay(path: &Path) -> StoreResult<Vec<Document>> {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StoreError::read_io(
                    format!("Failed to read {}", path.display()),
                    e,
                ))
            }
        };

        let mut documents: Vec<Document> = Vec::new();
        let mut offset = 0;
        while offset < data.len() {
            let (record, consumed) =
                DocumentRecord::deserialize(&data[offset..]).map_err(|e| {
                    StoreError::read_io(
                        format!("Corrupt record at offset {} in {}", offset, path.display()),
                        e,
                    )
                })?;
            offset += consumed;

            let filter = Filter::by_id(&record.document_id);
            let existing = documents.iter().position(|doc| filter.matches(doc));

            if record.is_tombstone {
                if let Some(pos) = existing {
                    documents.remove(pos);
                }
                continue;
            }

            let doc = match serde_json::from_slice::<Value>(&record.document_body) {
                Ok(Value::Object(doc)) => doc,
                _ => {
                    return Err(StoreError::read_failed(format!(
                        "Record for '{}' in {} is not a JSON object",
                        record.document_id,
                        path.display()
                    )))
                }
            };
            match existing {
                Some(pos) => documents[pos] = doc,
                None => documents.push(doc),
            }
        }

        Ok(documents)
    }

    async fn run<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut FileState) -> StoreResult<T> + Send + 'static,
    {
        self.connection.ensure_open()?;
        let state = Arc::clone(&self.state);
        tokio::task::spawn_blocking(move || {
            let mut state = state
                .lock()
                .map_err(|_| StoreError::unavailable("Collection lock poisoned"))?;
            op(&mut *state)
        })
        .await
        .map_err(|e| StoreError::unavailable(format!("Store task failed: {}", e)))?
    }
}

#[async_trait]
impl DocumentCollection for FileCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn insert_one(&self, doc: Document) -> StoreResult<()> {
        let id = document_id(&doc)?.to_string();
        let collection = self.name.clone();
        self.run(move |state| {
            if state.position(&Filter::by_id(&id)).is_some() {
                return Err(StoreError::write_failed(format!(
                    "Duplicate id '{}' in collection '{}'",
                    id, collection
                )));
            }
            let body = FileState::encode(&doc)?;
            state.append(&DocumentRecord::live(id, body))?;
            state.documents.push(doc);
            Ok(())
        })
        .await
    }

    async fn find_one(&self, filter: &Filter) -> StoreResult<Option<Document>> {
        let filter = filter.clone();
        self.run(move |state| {
            Ok(state
                .position(&filter)
                .map(|pos| state.documents[pos].clone()))
        })
        .await
    }

    async fn find_all(&self) -> StoreResult<Vec<Document>> {
        self.run(|state| Ok(state.documents.clone())).await
    }

    async fn replace_one(&self, filter: &Filter, doc: Document) -> StoreResult<u64> {
        let filter = filter.clone();
        self.run(move |state| {
            let Some(pos) = state.position(&filter) else {
                return Ok(0);
            };
            // Records are keyed by the stored id, which replacement keeps
            let id = document_id(&state.documents[pos])?.to_string();
            let body = FileState::encode(&doc)?;
            state.append(&DocumentRecord::live(id, body))?;
            state.documents[pos] = doc;
            Ok(1)
        })
        .await
    }

    async fn delete_one(&self, filter: &Filter) -> StoreResult<u64> {
        let filter = filter.clone();
        self.run(move |state| {
            let Some(pos) = state.position(&filter) else {
                return Ok(0);
            };
            let id = document_id(&state.documents[pos])?.to_string();
            state.append(&DocumentRecord::tombstone(id))?;
            state.documents.remove(pos);
            Ok(1)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    fn open(dir: &TempDir) -> FileCollection {
        FileCollection::open(
            "books",
            dir.path().join("db/books.dat"),
            ConnectionState::new(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_open_creates_directories() {
        let dir = TempDir::new().unwrap();
        let coll = open(&dir);
        assert!(dir.path().join("db").exists());
        assert!(coll.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replay_applies_replace_and_delete() {
        let dir = TempDir::new().unwrap();
        {
            let coll = open(&dir);
            coll.insert_one(doc(json!({"id": "a", "v": 1}))).await.unwrap();
            coll.insert_one(doc(json!({"id": "b", "v": 1}))).await.unwrap();
            coll.insert_one(doc(json!({"id": "c", "v": 1}))).await.unwrap();
            coll.replace_one(&Filter::by_id("a"), doc(json!({"id": "a", "v": 2})))
                .await
                .unwrap();
            coll.delete_one(&Filter::by_id("b")).await.unwrap();
        }

        let coll = open(&dir);
        let all = coll.find_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0]["id"], "a");
        assert_eq!(all[0]["v"], 2);
        assert_eq!(all[1]["id"], "c");
    }

    #[tokio::test]
    async fn test_delete_missing_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let coll = open(&dir);
        coll.insert_one(doc(json!({"id": "a"}))).await.unwrap();
        let before = fs::metadata(coll.path()).unwrap().len();

        assert_eq!(coll.delete_one(&Filter::by_id("zzz")).await.unwrap(), 0);
        assert_eq!(
            coll.replace_one(&Filter::by_id("zzz"), doc(json!({"id": "zzz"})))
                .await
                .unwrap(),
            0
        );
        assert_eq!(fs::metadata(coll.path()).unwrap().len(), before);
    }

    #[tokio::test]
    async fn test_untruncatable_append_stops_writes() {
        let dir = TempDir::new().unwrap();
        let coll = open(&dir);
        coll.insert_one(doc(json!({"id": "a"}))).await.unwrap();

        // A read-only handle fails both the write and the truncation
        coll.state.lock().unwrap().file = File::open(coll.path()).unwrap();

        match coll.insert_one(doc(json!({"id": "b"}))).await {
            Err(StoreError::WriteFailed(msg)) => assert!(msg.contains("truncating")),
            other => panic!("expected WriteFailed, got {:?}", other),
        }
        assert!(matches!(
            coll.insert_one(doc(json!({"id": "c"}))).await,
            Err(StoreError::StoreUnavailable(_))
        ));
        assert!(matches!(
            coll.delete_one(&Filter::by_id("a")).await,
            Err(StoreError::StoreUnavailable(_))
        ));

        // The view never took the failed write
        let all = coll.find_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0]["id"], "a");
        drop(coll);

        let reopened = open(&dir);
        assert_eq!(reopened.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_file_fails_open() {
        let dir = TempDir::new().unwrap();
        {
            let coll = open(&dir);
            coll.insert_one(doc(json!({"id": "a", "name": "x"}))).await.unwrap();
        }
        let path = dir.path().join("db/books.dat");
        let mut contents = fs::read(&path).unwrap();
        let last = contents.len() - 6;
        contents[last] ^= 0xFF;
        fs::write(&path, contents).unwrap();

        let result = FileCollection::open("books", &path, ConnectionState::new());
        match result {
            Err(StoreError::ReadFailed(msg)) => assert!(msg.contains("Checksum")),
            Err(other) => panic!("expected ReadFailed, got {:?}", other),
            Ok(_) => panic!("corruption must not be ignored"),
        }
    }
}
