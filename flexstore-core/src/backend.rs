//! Storage backend abstraction for the document store.
//!
//! This module defines the traits that abstract over different storage implementations,
//! allowing the document store to run on a volatile in-memory map or on a durable
//! SQLite database without changing any of its semantics.
//!
//! # Overview
//!
//! A backend persists two relations: collections, keyed by name, and documents, keyed
//! by `(id, collection_name)` and owned by their collection (deleting a collection
//! deletes its documents).
//!
//! Reads are individual async calls. Writes are always expressed as a [`WriteBatch`]
//! and applied through [`StoreBackend::commit`]: a batch is the unit of atomicity.
//! Either every [`WriteOp`] in it takes effect, or none does and the first failure is
//! returned. A single write is simply a batch of one, see [`StoreBackend::execute`].
//!
//! # Traits
//!
//! - [`StoreBackend`]: The core trait for storage backends
//! - [`StoreBackendBuilder`]: Factory trait for creating initialized backend instances
//!
//! # Examples
//!
//! ```ignore
//! use flexstore::backend::{StoreBackend, WriteBatch};
//! use flexstore::{collection::Collection, document::Document};
//!
//! let backend = MyBackendImpl::new();
//!
//! let mut batch = WriteBatch::new();
//! batch
//!     .ensure_collection(Collection::new("users"))
//!     .insert_document(document)
//!     .touch_collection("users", chrono::Utc::now());
//!
//! backend.commit(batch).await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::value::RawValue;
use std::{fmt::Debug, sync::Arc};

use crate::{collection::Collection, document::Document, error::DocumentStoreResult};

/// A single write statement inside a [`WriteBatch`].
///
/// The failure semantics of each operation are part of the backend contract and must
/// be enforced by every implementation.
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Inserts a collection. Fails with `CollectionAlreadyExists` if the name is taken.
    InsertCollection(Collection),
    /// Inserts a collection unless one with the same name already exists.
    EnsureCollection(Collection),
    /// Deletes a collection and every document in it.
    /// Fails with `CollectionNotFound` if it does not exist.
    DeleteCollection { name: String },
    /// Moves a collection's `updated_at` forward to `at`. Never moves it backwards.
    /// Fails with `CollectionNotFound` if it does not exist.
    TouchCollection { name: String, at: DateTime<Utc> },
    /// Inserts a document. Fails with `DocumentAlreadyExists` if `(id, collection)` is
    /// occupied and with `CollectionNotFound` if the owning collection does not exist.
    InsertDocument(Document),
    /// Replaces a document's data and sets its `updated_at`.
    /// Fails with `DocumentNotFound` if it does not exist.
    UpdateDocument {
        id: String,
        collection: String,
        data: Box<RawValue>,
        at: DateTime<Utc>,
    },
    /// Deletes a document. Fails with `DocumentNotFound` if it does not exist.
    DeleteDocument { id: String, collection: String },
}

impl WriteOp {
    /// Name of the collection this operation writes to.
    pub fn collection(&self) -> &str {
        match self {
            WriteOp::InsertCollection(c) | WriteOp::EnsureCollection(c) => &c.name,
            WriteOp::DeleteCollection { name } | WriteOp::TouchCollection { name, .. } => name,
            WriteOp::InsertDocument(d) => &d.collection_name,
            WriteOp::UpdateDocument { collection, .. }
            | WriteOp::DeleteDocument { collection, .. } => collection,
        }
    }
}

/// An ordered group of writes applied atomically by [`StoreBackend::commit`].
///
/// Building a batch opens the transaction, committing it applies every operation in
/// order, and dropping it without committing discards it. If any operation fails the
/// backend rolls back the operations already applied from this batch, so no partial
/// state is ever visible to readers.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Creates an empty batch with room for `capacity` operations.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { ops: Vec::with_capacity(capacity) }
    }

    /// Appends an operation to the batch.
    pub fn push(&mut self, op: WriteOp) -> &mut Self {
        self.ops.push(op);
        self
    }

    pub fn insert_collection(&mut self, collection: Collection) -> &mut Self {
        self.push(WriteOp::InsertCollection(collection))
    }

    pub fn ensure_collection(&mut self, collection: Collection) -> &mut Self {
        self.push(WriteOp::EnsureCollection(collection))
    }

    pub fn delete_collection(&mut self, name: &str) -> &mut Self {
        self.push(WriteOp::DeleteCollection { name: name.to_string() })
    }

    pub fn touch_collection(&mut self, name: &str, at: DateTime<Utc>) -> &mut Self {
        self.push(WriteOp::TouchCollection { name: name.to_string(), at })
    }

    pub fn insert_document(&mut self, document: Document) -> &mut Self {
        self.push(WriteOp::InsertDocument(document))
    }

    pub fn update_document(
        &mut self,
        id: &str,
        collection: &str,
        data: Box<RawValue>,
        at: DateTime<Utc>,
    ) -> &mut Self {
        self.push(WriteOp::UpdateDocument {
            id: id.to_string(),
            collection: collection.to_string(),
            data,
            at,
        })
    }

    pub fn delete_document(&mut self, id: &str, collection: &str) -> &mut Self {
        self.push(WriteOp::DeleteDocument {
            id: id.to_string(),
            collection: collection.to_string(),
        })
    }

    /// Number of operations in the batch.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns `true` if the batch holds no operations.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// The operations in application order.
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    /// Consumes the batch, yielding its operations in application order.
    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

impl From<WriteOp> for WriteBatch {
    fn from(op: WriteOp) -> Self {
        Self { ops: vec![op] }
    }
}

impl FromIterator<WriteOp> for WriteBatch {
    fn from_iter<I: IntoIterator<Item = WriteOp>>(iter: I) -> Self {
        Self { ops: iter.into_iter().collect() }
    }
}

/// Abstract interface for document storage backends.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and support concurrent access from multiple
/// async tasks. Reads may run concurrently with each other. Writes are serialized:
/// a backend holds at most one writer at a time, and a committing batch has exclusive
/// access for its whole duration.
///
/// # Error Handling
///
/// Operations return [`DocumentStoreResult<T>`](crate::error::DocumentStoreResult).
/// Absence on the read path is reported as `Ok(None)`, `Ok(false)` or an empty list;
/// only writes turn absence into an error (see [`WriteOp`]). Backends never retry.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Ensures the collections and documents relations exist.
    ///
    /// Must be idempotent: running it against an already initialized store is a
    /// no-op that neither fails nor loses data.
    async fn initialize(&self) -> DocumentStoreResult<()>;

    /// Applies every operation of `batch` atomically.
    ///
    /// # Returns
    ///
    /// Returns `Ok(())` once all operations are durable, or the error of the first
    /// failing operation after everything from this batch has been rolled back.
    async fn commit(&self, batch: WriteBatch) -> DocumentStoreResult<()>;

    /// Applies a single write operation.
    async fn execute(&self, op: WriteOp) -> DocumentStoreResult<()> {
        self.commit(WriteBatch::from(op)).await
    }

    /// Fetches a collection by name, or `None` if it does not exist.
    async fn get_collection(&self, name: &str) -> DocumentStoreResult<Option<Collection>>;

    /// Returns whether a collection with the given name exists.
    async fn collection_exists(&self, name: &str) -> DocumentStoreResult<bool>;

    /// Lists every collection, ordered by name ascending.
    async fn list_collections(&self) -> DocumentStoreResult<Vec<Collection>>;

    /// Counts the collections in the store.
    async fn count_collections(&self) -> DocumentStoreResult<usize>;

    /// Fetches a document by its ID within a collection, or `None` if it does not exist.
    async fn get_document(
        &self,
        id: &str,
        collection: &str,
    ) -> DocumentStoreResult<Option<Document>>;

    /// Returns whether a document with the given ID exists in the collection.
    async fn document_exists(&self, id: &str, collection: &str) -> DocumentStoreResult<bool>;

    /// Counts the documents in a collection. Missing collections count as empty.
    async fn count_documents(&self, collection: &str) -> DocumentStoreResult<usize>;

    /// Lists a window of a collection's documents.
    ///
    /// Documents are ordered by `created_at` descending; documents created at the same
    /// instant are ordered most recently inserted first. `offset` documents are
    /// skipped and at most `limit` are returned.
    async fn list_documents(
        &self,
        collection: &str,
        limit: usize,
        offset: usize,
    ) -> DocumentStoreResult<Vec<Document>>;

    /// Cleanly shuts down the backend, releasing all resources.
    ///
    /// The default implementation is a no-op, but backends holding connections or
    /// file handles should override this.
    async fn shutdown(&self) -> DocumentStoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl<B> StoreBackend for &B
where
    B: StoreBackend + ?Sized,
{
    async fn initialize(&self) -> DocumentStoreResult<()> {
        (**self).initialize().await
    }

    async fn commit(&self, batch: WriteBatch) -> DocumentStoreResult<()> {
        (**self).commit(batch).await
    }

    async fn get_collection(&self, name: &str) -> DocumentStoreResult<Option<Collection>> {
        (**self).get_collection(name).await
    }

    async fn collection_exists(&self, name: &str) -> DocumentStoreResult<bool> {
        (**self).collection_exists(name).await
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<Collection>> {
        (**self).list_collections().await
    }

    async fn count_collections(&self) -> DocumentStoreResult<usize> {
        (**self).count_collections().await
    }

    async fn get_document(
        &self,
        id: &str,
        collection: &str,
    ) -> DocumentStoreResult<Option<Document>> {
        (**self).get_document(id, collection).await
    }

    async fn document_exists(&self, id: &str, collection: &str) -> DocumentStoreResult<bool> {
        (**self).document_exists(id, collection).await
    }

    async fn count_documents(&self, collection: &str) -> DocumentStoreResult<usize> {
        (**self).count_documents(collection).await
    }

    async fn list_documents(
        &self,
        collection: &str,
        limit: usize,
        offset: usize,
    ) -> DocumentStoreResult<Vec<Document>> {
        (**self)
            .list_documents(collection, limit, offset)
            .await
    }

    async fn shutdown(&self) -> DocumentStoreResult<()> {
        (**self).shutdown().await
    }
}

#[async_trait]
impl<B> StoreBackend for Arc<B>
where
    B: StoreBackend + ?Sized,
{
    async fn initialize(&self) -> DocumentStoreResult<()> {
        (**self).initialize().await
    }

    async fn commit(&self, batch: WriteBatch) -> DocumentStoreResult<()> {
        (**self).commit(batch).await
    }

    async fn get_collection(&self, name: &str) -> DocumentStoreResult<Option<Collection>> {
        (**self).get_collection(name).await
    }

    async fn collection_exists(&self, name: &str) -> DocumentStoreResult<bool> {
        (**self).collection_exists(name).await
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<Collection>> {
        (**self).list_collections().await
    }

    async fn count_collections(&self) -> DocumentStoreResult<usize> {
        (**self).count_collections().await
    }

    async fn get_document(
        &self,
        id: &str,
        collection: &str,
    ) -> DocumentStoreResult<Option<Document>> {
        (**self).get_document(id, collection).await
    }

    async fn document_exists(&self, id: &str, collection: &str) -> DocumentStoreResult<bool> {
        (**self).document_exists(id, collection).await
    }

    async fn count_documents(&self, collection: &str) -> DocumentStoreResult<usize> {
        (**self).count_documents(collection).await
    }

    async fn list_documents(
        &self,
        collection: &str,
        limit: usize,
        offset: usize,
    ) -> DocumentStoreResult<Vec<Document>> {
        (**self)
            .list_documents(collection, limit, offset)
            .await
    }

    async fn shutdown(&self) -> DocumentStoreResult<()> {
        (**self).shutdown().await
    }
}

/// A backend shared behind dynamic dispatch, for picking the storage engine at runtime.
pub type DynStoreBackend = Arc<dyn StoreBackend>;

#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    /// Opens the backend and runs [`StoreBackend::initialize`] on it.
    async fn build(self) -> DocumentStoreResult<Self::Backend>;
}
