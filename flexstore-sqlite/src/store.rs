//! SQLite storage backend.
//!
//! One writer connection behind a mutex is the only connection that ever writes, so
//! writes are serialized by the backend itself. Reads are spread round-robin over a
//! set of read-only connections and run concurrently with each other and, in WAL
//! mode, with the writer. All SQLite calls run on Tokio's blocking pool.

use std::{
    fmt,
    path::Path,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use rusqlite::{Connection, OpenFlags, OptionalExtension, Transaction, ffi, params};
use tracing::{debug, info};

use flexstore_core::{
    backend::{StoreBackend, StoreBackendBuilder, WriteBatch, WriteOp},
    collection::Collection,
    document::Document,
    error::{DocumentStoreError, DocumentStoreResult},
};

use crate::{
    codec::{
        COLLECTION_COLUMNS, DOCUMENT_COLUMNS, collection_from_row, document_from_row,
        encode_timestamp,
    },
    config::{SqliteJournalMode, SqliteStoreConfig},
    schema::initialize_schema,
};

struct Connections {
    config: SqliteStoreConfig,
    writer: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    cursor: AtomicUsize,
}

impl Connections {
    fn writer(&self, context: &str) -> DocumentStoreResult<std::sync::MutexGuard<'_, Connection>> {
        self.writer
            .lock()
            .map_err(|_| DocumentStoreError::storage(context, "writer connection poisoned"))
    }

    fn reader(&self, context: &str) -> DocumentStoreResult<std::sync::MutexGuard<'_, Connection>> {
        if self.readers.is_empty() {
            return self.writer(context);
        }

        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        self.readers[index]
            .lock()
            .map_err(|_| DocumentStoreError::storage(context, "read connection poisoned"))
    }
}

/// Durable document storage backend on SQLite.
///
/// Cloning is cheap; clones share the same connections.
///
/// # Example
///
/// ```ignore
/// use flexstore::sqlite::{SqliteStore, SqliteStoreConfig};
/// use flexstore::backend::StoreBackendBuilder;
///
/// let backend = SqliteStore::builder(SqliteStoreConfig::new("data/db.sqlite"))
///     .build()
///     .await?;
/// ```
#[derive(Clone)]
pub struct SqliteStore {
    connections: Arc<Connections>,
}

impl fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteStore")
            .field("path", &self.connections.config.path)
            .field("read_connections", &self.connections.readers.len())
            .finish()
    }
}

impl SqliteStore {
    /// Opens the database described by `config`.
    ///
    /// Creates the database file and its parent directories if needed. The schema is
    /// not touched; call [`StoreBackend::initialize`] or use [`SqliteStore::builder`].
    ///
    /// # Errors
    ///
    /// Returns `Initialization` if a connection cannot be opened or configured.
    pub fn open(config: SqliteStoreConfig) -> DocumentStoreResult<Self> {
        let writer = if config.is_in_memory() {
            Connection::open_in_memory().map_err(init_error)?
        } else {
            ensure_parent_dir(&config.path)?;
            Connection::open_with_flags(
                &config.path,
                OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_CREATE
                    | OpenFlags::SQLITE_OPEN_FULL_MUTEX,
            )
            .map_err(init_error)?
        };
        apply_pragmas(&writer, &config)?;
        if !config.is_in_memory() {
            // journal_mode answers with the resulting mode, so it is run as a query.
            writer
                .query_row(
                    &format!("PRAGMA journal_mode = {}", config.journal_mode.pragma_value()),
                    [],
                    |_| Ok(()),
                )
                .map_err(init_error)?;
        }

        let reader_count = if config.is_in_memory() { 0 } else { config.read_connections };
        let mut readers = Vec::with_capacity(reader_count);
        for _ in 0..reader_count {
            let reader = Connection::open_with_flags(
                &config.path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_FULL_MUTEX,
            )
            .map_err(init_error)?;
            apply_pragmas(&reader, &config)?;
            readers.push(Mutex::new(reader));
        }

        info!(
            path = %config.path.display(),
            read_connections = readers.len(),
            "opened sqlite store"
        );

        Ok(Self {
            connections: Arc::new(Connections {
                config,
                writer: Mutex::new(writer),
                readers,
                cursor: AtomicUsize::new(0),
            }),
        })
    }

    /// Creates a builder that opens and initializes a store for `config`.
    pub fn builder(config: SqliteStoreConfig) -> SqliteStoreBuilder {
        SqliteStoreBuilder::new(config)
    }

    /// The configuration this store was opened with.
    pub fn config(&self) -> &SqliteStoreConfig {
        &self.connections.config
    }

    async fn with_writer<T, F>(&self, context: &'static str, f: F) -> DocumentStoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> DocumentStoreResult<T> + Send + 'static,
    {
        let connections = Arc::clone(&self.connections);

        tokio::task::spawn_blocking(move || {
            let mut connection = connections.writer(context)?;
            f(&mut *connection)
        })
        .await
        .map_err(|e| DocumentStoreError::storage(context, e))?
    }

    async fn with_reader<T, F>(&self, context: &'static str, f: F) -> DocumentStoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let connections = Arc::clone(&self.connections);

        tokio::task::spawn_blocking(move || {
            let connection = connections.reader(context)?;
            f(&*connection).map_err(|e| DocumentStoreError::storage(context, e))
        })
        .await
        .map_err(|e| DocumentStoreError::storage(context, e))?
    }
}

#[async_trait]
impl StoreBackend for SqliteStore {
    async fn initialize(&self) -> DocumentStoreResult<()> {
        self.with_writer("initialize schema", |connection| {
            initialize_schema(connection).map_err(init_error)
        })
        .await?;

        info!(path = %self.connections.config.path.display(), "sqlite schema ready");
        Ok(())
    }

    async fn commit(&self, batch: WriteBatch) -> DocumentStoreResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let ops = batch.len();

        self.with_writer("commit batch", move |connection| {
            let tx = connection
                .transaction()
                .map_err(|e| DocumentStoreError::storage("begin transaction", e))?;

            for op in batch.into_ops() {
                apply(&tx, op)?;
            }

            tx.commit()
                .map_err(|e| DocumentStoreError::storage("commit transaction", e))
        })
        .await?;

        debug!(ops, "committed write batch");
        Ok(())
    }

    async fn get_collection(&self, name: &str) -> DocumentStoreResult<Option<Collection>> {
        let name = name.to_string();

        self.with_reader("get collection", move |connection| {
            connection
                .query_row(
                    &format!("SELECT {COLLECTION_COLUMNS} FROM collections WHERE name = ?1"),
                    params![name],
                    collection_from_row,
                )
                .optional()
        })
        .await
    }

    async fn collection_exists(&self, name: &str) -> DocumentStoreResult<bool> {
        let name = name.to_string();

        self.with_reader("check collection", move |connection| {
            connection.query_row(
                "SELECT EXISTS(SELECT 1 FROM collections WHERE name = ?1)",
                params![name],
                |row| row.get(0),
            )
        })
        .await
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<Collection>> {
        self.with_reader("list collections", |connection| {
            let mut stmt = connection.prepare_cached(&format!(
                "SELECT {COLLECTION_COLUMNS} FROM collections ORDER BY name ASC"
            ))?;
            let rows = stmt.query_map([], collection_from_row)?;

            rows.collect()
        })
        .await
    }

    async fn count_collections(&self) -> DocumentStoreResult<usize> {
        let count: i64 = self
            .with_reader("count collections", |connection| {
                connection.query_row("SELECT COUNT(*) FROM collections", [], |row| row.get(0))
            })
            .await?;

        Ok(usize::try_from(count).unwrap_or_default())
    }

    async fn get_document(
        &self,
        id: &str,
        collection: &str,
    ) -> DocumentStoreResult<Option<Document>> {
        let id = id.to_string();
        let collection = collection.to_string();

        self.with_reader("get document", move |connection| {
            connection
                .query_row(
                    &format!(
                        "SELECT {DOCUMENT_COLUMNS} FROM documents \
                         WHERE id = ?1 AND collection_name = ?2"
                    ),
                    params![id, collection],
                    document_from_row,
                )
                .optional()
        })
        .await
    }

    async fn document_exists(&self, id: &str, collection: &str) -> DocumentStoreResult<bool> {
        let id = id.to_string();
        let collection = collection.to_string();

        self.with_reader("check document", move |connection| {
            connection.query_row(
                "SELECT EXISTS(SELECT 1 FROM documents WHERE id = ?1 AND collection_name = ?2)",
                params![id, collection],
                |row| row.get(0),
            )
        })
        .await
    }

    async fn count_documents(&self, collection: &str) -> DocumentStoreResult<usize> {
        let collection = collection.to_string();

        let count: i64 = self
            .with_reader("count documents", move |connection| {
                connection.query_row(
                    "SELECT COUNT(*) FROM documents WHERE collection_name = ?1",
                    params![collection],
                    |row| row.get(0),
                )
            })
            .await?;

        Ok(usize::try_from(count).unwrap_or_default())
    }

    async fn list_documents(
        &self,
        collection: &str,
        limit: usize,
        offset: usize,
    ) -> DocumentStoreResult<Vec<Document>> {
        let collection = collection.to_string();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);

        self.with_reader("list documents", move |connection| {
            let mut stmt = connection.prepare_cached(&format!(
                "SELECT {DOCUMENT_COLUMNS} FROM documents \
                 WHERE collection_name = ?1 \
                 ORDER BY created_at DESC, rowid DESC \
                 LIMIT ?2 OFFSET ?3"
            ))?;
            let rows = stmt.query_map(params![collection, limit, offset], document_from_row)?;

            rows.collect()
        })
        .await
    }

    async fn shutdown(&self) -> DocumentStoreResult<()> {
        let checkpoint = !self.connections.config.is_in_memory()
            && self.connections.config.journal_mode == SqliteJournalMode::Wal;

        if checkpoint {
            self.with_writer("checkpoint", |connection| {
                connection
                    .query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))
                    .map_err(|e| DocumentStoreError::storage("checkpoint", e))
            })
            .await?;
        }

        info!(path = %self.connections.config.path.display(), "sqlite store shut down");
        Ok(())
    }
}

/// Applies one operation inside the batch transaction.
fn apply(tx: &Transaction<'_>, op: WriteOp) -> DocumentStoreResult<()> {
    match op {
        WriteOp::InsertCollection(collection) => {
            tx.execute(
                "INSERT INTO collections (name, created_at, updated_at) VALUES (?1, ?2, ?3)",
                params![
                    collection.name,
                    encode_timestamp(&collection.created_at),
                    encode_timestamp(&collection.updated_at),
                ],
            )
            .map_err(|e| match constraint_code(&e) {
                Some(ffi::SQLITE_CONSTRAINT_PRIMARYKEY) => {
                    DocumentStoreError::CollectionAlreadyExists(collection.name.clone())
                }
                _ => DocumentStoreError::storage("insert collection", e),
            })?;
        }
        WriteOp::EnsureCollection(collection) => {
            tx.execute(
                "INSERT INTO collections (name, created_at, updated_at) VALUES (?1, ?2, ?3) \
                 ON CONFLICT(name) DO NOTHING",
                params![
                    collection.name,
                    encode_timestamp(&collection.created_at),
                    encode_timestamp(&collection.updated_at),
                ],
            )
            .map_err(|e| DocumentStoreError::storage("ensure collection", e))?;
        }
        WriteOp::DeleteCollection { name } => {
            let deleted = tx
                .execute("DELETE FROM collections WHERE name = ?1", params![name])
                .map_err(|e| DocumentStoreError::storage("delete collection", e))?;
            if deleted == 0 {
                return Err(DocumentStoreError::CollectionNotFound(name));
            }
        }
        WriteOp::TouchCollection { name, at } => {
            let touched = tx
                .execute(
                    "UPDATE collections SET updated_at = MAX(updated_at, ?2) WHERE name = ?1",
                    params![name, encode_timestamp(&at)],
                )
                .map_err(|e| DocumentStoreError::storage("touch collection", e))?;
            if touched == 0 {
                return Err(DocumentStoreError::CollectionNotFound(name));
            }
        }
        WriteOp::InsertDocument(document) => {
            tx.execute(
                "INSERT INTO documents (id, collection_name, data, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    document.id,
                    document.collection_name,
                    document.data.get(),
                    encode_timestamp(&document.created_at),
                    encode_timestamp(&document.updated_at),
                ],
            )
            .map_err(|e| match constraint_code(&e) {
                Some(ffi::SQLITE_CONSTRAINT_PRIMARYKEY) => {
                    DocumentStoreError::DocumentAlreadyExists(
                        document.id.clone(),
                        document.collection_name.clone(),
                    )
                }
                Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => {
                    DocumentStoreError::CollectionNotFound(document.collection_name.clone())
                }
                _ => DocumentStoreError::storage("insert document", e),
            })?;
        }
        WriteOp::UpdateDocument { id, collection, data, at } => {
            let updated = tx
                .execute(
                    "UPDATE documents SET data = ?1, updated_at = ?2 \
                     WHERE id = ?3 AND collection_name = ?4",
                    params![data.get(), encode_timestamp(&at), id, collection],
                )
                .map_err(|e| DocumentStoreError::storage("update document", e))?;
            if updated == 0 {
                return Err(DocumentStoreError::DocumentNotFound(id, collection));
            }
        }
        WriteOp::DeleteDocument { id, collection } => {
            let deleted = tx
                .execute(
                    "DELETE FROM documents WHERE id = ?1 AND collection_name = ?2",
                    params![id, collection],
                )
                .map_err(|e| DocumentStoreError::storage("delete document", e))?;
            if deleted == 0 {
                return Err(DocumentStoreError::DocumentNotFound(id, collection));
            }
        }
    }

    Ok(())
}

/// Extended result code of a failed statement, if it failed on a constraint.
fn constraint_code(err: &rusqlite::Error) -> Option<i32> {
    match err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Some(e.extended_code)
        }
        _ => None,
    }
}

fn init_error(err: rusqlite::Error) -> DocumentStoreError {
    DocumentStoreError::Initialization(err.to_string())
}

fn ensure_parent_dir(path: &Path) -> DocumentStoreResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|e| {
                DocumentStoreError::Initialization(format!("create {}: {e}", parent.display()))
            })
        }
        _ => Ok(()),
    }
}

fn apply_pragmas(connection: &Connection, config: &SqliteStoreConfig) -> DocumentStoreResult<()> {
    connection
        .execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(init_error)?;
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(init_error)?;

    Ok(())
}

/// Builder that opens a [`SqliteStore`] and initializes its schema.
#[derive(Debug, Clone)]
pub struct SqliteStoreBuilder {
    config: SqliteStoreConfig,
}

impl SqliteStoreBuilder {
    pub fn new(config: SqliteStoreConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl StoreBackendBuilder for SqliteStoreBuilder {
    type Backend = SqliteStore;

    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        let config = self.config;
        let store = tokio::task::spawn_blocking(move || SqliteStore::open(config))
            .await
            .map_err(|e| DocumentStoreError::Initialization(e.to_string()))??;
        store.initialize().await?;

        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use flexstore_core::document::parse_payload;

    fn document(id: &str, collection: &str) -> Document {
        Document::new(id, collection, parse_payload(br#"{"n":1}"#).unwrap(), Utc::now())
    }

    async fn open(dir: &tempfile::TempDir) -> SqliteStore {
        SqliteStore::builder(SqliteStoreConfig::new(dir.path().join("nested/db.sqlite")))
            .build()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn initialize_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir).await;
        store
            .execute(WriteOp::InsertCollection(Collection::new("users")))
            .await
            .unwrap();

        store.initialize().await.unwrap();
        store.shutdown().await.unwrap();
        drop(store);
        let reopened = open(&dir).await;

        assert!(reopened.collection_exists("users").await.unwrap());
    }

    #[tokio::test]
    async fn constraint_failures_map_to_domain_errors() {
        let store = SqliteStore::builder(SqliteStoreConfig::in_memory())
            .build()
            .await
            .unwrap();
        store
            .execute(WriteOp::InsertCollection(Collection::new("users")))
            .await
            .unwrap();

        let duplicate = store
            .execute(WriteOp::InsertCollection(Collection::new("users")))
            .await
            .unwrap_err();
        assert!(matches!(duplicate, DocumentStoreError::CollectionAlreadyExists(_)));

        let orphan = store
            .execute(WriteOp::InsertDocument(document("1", "missing")))
            .await
            .unwrap_err();
        assert!(matches!(orphan, DocumentStoreError::CollectionNotFound(_)));

        store
            .execute(WriteOp::InsertDocument(document("1", "users")))
            .await
            .unwrap();
        let taken = store
            .execute(WriteOp::InsertDocument(document("1", "users")))
            .await
            .unwrap_err();
        assert!(matches!(taken, DocumentStoreError::DocumentAlreadyExists(..)));
    }

    #[tokio::test]
    async fn failed_batch_is_rolled_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir).await;

        let mut batch = WriteBatch::new();
        batch
            .insert_collection(Collection::new("users"))
            .insert_document(document("1", "users"))
            .delete_document("absent", "users");
        let err = store.commit(batch).await.unwrap_err();

        assert!(matches!(err, DocumentStoreError::DocumentNotFound(..)));
        assert!(!store.collection_exists("users").await.unwrap());
        assert_eq!(store.count_documents("users").await.unwrap(), 0);
    }
}
