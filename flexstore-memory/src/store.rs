//! In-memory storage implementation for document stores.
//!
//! Collections live in a `BTreeMap` so they come back in name order; each holds its
//! documents in a `HashMap` keyed by ID. Every document carries the sequence number
//! of its insertion, which orders documents created at the same instant.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mea::rwlock::RwLock;
use tracing::debug;

use flexstore_core::{
    backend::{StoreBackend, StoreBackendBuilder, WriteBatch, WriteOp},
    collection::Collection,
    document::Document,
    error::{DocumentStoreError, DocumentStoreResult},
};

#[derive(Debug, Clone)]
struct StoredDocument {
    document: Document,
    seq: u64,
}

#[derive(Debug, Clone)]
struct CollectionEntry {
    collection: Collection,
    documents: HashMap<String, StoredDocument>,
}

impl CollectionEntry {
    fn new(collection: Collection) -> Self {
        Self { collection, documents: HashMap::new() }
    }
}

#[derive(Debug, Default)]
struct StoreState {
    collections: BTreeMap<String, CollectionEntry>,
    next_seq: u64,
}

/// Reverts one applied [`WriteOp`].
#[derive(Debug)]
enum Undo {
    RemoveCollection(String),
    RestoreCollection(String, CollectionEntry),
    RestoreUpdatedAt(String, DateTime<Utc>),
    RemoveDocument { collection: String, id: String },
    RestoreDocument { collection: String, stored: StoredDocument },
}

impl StoreState {
    fn apply(&mut self, op: WriteOp, undo: &mut Vec<Undo>) -> DocumentStoreResult<()> {
        match op {
            WriteOp::InsertCollection(collection) => {
                if self.collections.contains_key(&collection.name) {
                    return Err(DocumentStoreError::CollectionAlreadyExists(collection.name));
                }
                undo.push(Undo::RemoveCollection(collection.name.clone()));
                self.collections
                    .insert(collection.name.clone(), CollectionEntry::new(collection));
            }
            WriteOp::EnsureCollection(collection) => {
                if !self.collections.contains_key(&collection.name) {
                    undo.push(Undo::RemoveCollection(collection.name.clone()));
                    self.collections
                        .insert(collection.name.clone(), CollectionEntry::new(collection));
                }
            }
            WriteOp::DeleteCollection { name } => {
                let entry = self
                    .collections
                    .remove(&name)
                    .ok_or_else(|| DocumentStoreError::CollectionNotFound(name.clone()))?;
                undo.push(Undo::RestoreCollection(name, entry));
            }
            WriteOp::TouchCollection { name, at } => {
                let entry = self
                    .collections
                    .get_mut(&name)
                    .ok_or_else(|| DocumentStoreError::CollectionNotFound(name.clone()))?;
                undo.push(Undo::RestoreUpdatedAt(name, entry.collection.updated_at));
                entry.collection.touch(at);
            }
            WriteOp::InsertDocument(document) => {
                let entry = self
                    .collections
                    .get_mut(&document.collection_name)
                    .ok_or_else(|| {
                        DocumentStoreError::CollectionNotFound(document.collection_name.clone())
                    })?;
                if entry.documents.contains_key(&document.id) {
                    return Err(DocumentStoreError::DocumentAlreadyExists(
                        document.id,
                        document.collection_name,
                    ));
                }

                let seq = self.next_seq;
                self.next_seq += 1;

                undo.push(Undo::RemoveDocument {
                    collection: document.collection_name.clone(),
                    id: document.id.clone(),
                });
                entry
                    .documents
                    .insert(document.id.clone(), StoredDocument { document, seq });
            }
            WriteOp::UpdateDocument { id, collection, data, at } => {
                let stored = self
                    .collections
                    .get_mut(&collection)
                    .and_then(|entry| entry.documents.get_mut(&id))
                    .ok_or_else(|| {
                        DocumentStoreError::DocumentNotFound(id.clone(), collection.clone())
                    })?;
                undo.push(Undo::RestoreDocument {
                    collection,
                    stored: stored.clone(),
                });
                stored.document.data = data;
                stored.document.updated_at = at;
            }
            WriteOp::DeleteDocument { id, collection } => {
                let stored = self
                    .collections
                    .get_mut(&collection)
                    .and_then(|entry| entry.documents.remove(&id))
                    .ok_or_else(|| {
                        DocumentStoreError::DocumentNotFound(id.clone(), collection.clone())
                    })?;
                undo.push(Undo::RestoreDocument { collection, stored });
            }
        }

        Ok(())
    }

    fn revert(&mut self, undo: Vec<Undo>) {
        for step in undo.into_iter().rev() {
            match step {
                Undo::RemoveCollection(name) => {
                    self.collections.remove(&name);
                }
                Undo::RestoreCollection(name, entry) => {
                    self.collections.insert(name, entry);
                }
                Undo::RestoreUpdatedAt(name, at) => {
                    if let Some(entry) = self.collections.get_mut(&name) {
                        entry.collection.updated_at = at;
                    }
                }
                Undo::RemoveDocument { collection, id } => {
                    if let Some(entry) = self.collections.get_mut(&collection) {
                        entry.documents.remove(&id);
                    }
                }
                Undo::RestoreDocument { collection, stored } => {
                    if let Some(entry) = self.collections.get_mut(&collection) {
                        entry
                            .documents
                            .insert(stored.document.id.clone(), stored);
                    }
                }
            }
        }
    }
}

/// Thread-safe in-memory document storage backend.
///
/// This struct implements the [`StoreBackend`] trait entirely in memory behind an
/// async-aware read-write lock. Reads share the lock; a committing batch holds the
/// write lock for its whole duration, which makes it the single writer.
///
/// # Thread Safety
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state, allowing
/// it to be safely shared across async tasks. Multiple clones of the same instance
/// share the same underlying data.
///
/// # Performance
///
/// Listing sorts the whole collection on every call (no indexing). Nothing is
/// persisted: the data is gone when the last clone is dropped.
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryStore {
    /// Creates a new, empty in-memory document store.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(StoreState::default())),
        }
    }

    /// Creates a builder for constructing an `InMemoryStore`.
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn initialize(&self) -> DocumentStoreResult<()> {
        Ok(())
    }

    async fn commit(&self, batch: WriteBatch) -> DocumentStoreResult<()> {
        let mut state = self.state.write().await;
        let mut undo = Vec::with_capacity(batch.len());

        for op in batch.into_ops() {
            if let Err(e) = state.apply(op, &mut undo) {
                debug!(applied = undo.len(), error = %e, "rolling back write batch");
                state.revert(undo);
                return Err(e);
            }
        }

        Ok(())
    }

    async fn get_collection(&self, name: &str) -> DocumentStoreResult<Option<Collection>> {
        Ok(self
            .state
            .read()
            .await
            .collections
            .get(name)
            .map(|entry| entry.collection.clone()))
    }

    async fn collection_exists(&self, name: &str) -> DocumentStoreResult<bool> {
        Ok(self.state.read().await.collections.contains_key(name))
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<Collection>> {
        Ok(self
            .state
            .read()
            .await
            .collections
            .values()
            .map(|entry| entry.collection.clone())
            .collect())
    }

    async fn count_collections(&self) -> DocumentStoreResult<usize> {
        Ok(self.state.read().await.collections.len())
    }

    async fn get_document(
        &self,
        id: &str,
        collection: &str,
    ) -> DocumentStoreResult<Option<Document>> {
        Ok(self
            .state
            .read()
            .await
            .collections
            .get(collection)
            .and_then(|entry| entry.documents.get(id))
            .map(|stored| stored.document.clone()))
    }

    async fn document_exists(&self, id: &str, collection: &str) -> DocumentStoreResult<bool> {
        Ok(self
            .state
            .read()
            .await
            .collections
            .get(collection)
            .is_some_and(|entry| entry.documents.contains_key(id)))
    }

    async fn count_documents(&self, collection: &str) -> DocumentStoreResult<usize> {
        Ok(self
            .state
            .read()
            .await
            .collections
            .get(collection)
            .map_or(0, |entry| entry.documents.len()))
    }

    async fn list_documents(
        &self,
        collection: &str,
        limit: usize,
        offset: usize,
    ) -> DocumentStoreResult<Vec<Document>> {
        let state = self.state.read().await;
        let entry = match state.collections.get(collection) {
            Some(entry) => entry,
            None => return Ok(vec![]),
        };

        let mut documents = entry.documents.values().collect::<Vec<_>>();
        documents.sort_by(|a, b| {
            b.document
                .created_at
                .cmp(&a.document.created_at)
                .then_with(|| b.seq.cmp(&a.seq))
        });

        Ok(documents
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|stored| stored.document.clone())
            .collect())
    }
}

/// Builder for constructing [`InMemoryStore`] instances.
///
/// # Example
///
/// ```ignore
/// use flexstore::memory::InMemoryStore;
/// use flexstore::backend::StoreBackendBuilder;
///
/// let store = InMemoryStore::builder().build().await?;
/// ```
#[derive(Default)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        let store = InMemoryStore::new();
        store.initialize().await?;

        Ok(store)
    }
}
