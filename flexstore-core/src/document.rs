//! Documents: opaque JSON payloads addressed by an ID unique within their collection.
//!
//! This module provides the [`Document`] record and the [`Documents`] handle, which
//! implements document CRUD, pagination and the all-or-nothing bulk insert.
//!
//! Payloads are kept as [`RawValue`], so a document's data is returned exactly as it
//! was stored. The only constraint on a payload is that it is well-formed JSON.
//!
//! Every mutation also touches the owning collection, in the same atomic write.
//!
//! # Example
//!
//! ```ignore
//! use flexstore::{store::DocumentStore, memory::InMemoryStore};
//!
//! let store = DocumentStore::new(InMemoryStore::new());
//! let users = store.documents("users");
//!
//! // The collection is created on first write.
//! let alice = users.create(br#"{"name":"Alice"}"#).await?;
//! let fetched = users.get(&alice.id).await?;
//! assert_eq!(fetched.data.get(), r#"{"name":"Alice"}"#);
//! # Ok::<(), flexstore::error::DocumentStoreError>(())
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, value::RawValue};
use tracing::{debug, warn};

use crate::{
    backend::{StoreBackend, WriteBatch},
    collection::{Collection, validate_collection_name},
    error::{DocumentStoreError, DocumentStoreResult},
    id::IdGenerator,
    ingest,
    page::DocumentList,
    query::DocumentQuery,
};

/// A schemaless JSON document stored in a collection.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Document {
    /// Unique within `collection_name` only.
    pub id: String,
    pub collection_name: String,
    /// The payload, verbatim.
    pub data: Box<RawValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Creates a document record with `created_at == updated_at == at`.
    pub fn new(
        id: impl Into<String>,
        collection_name: impl Into<String>,
        data: Box<RawValue>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            collection_name: collection_name.into(),
            data,
            created_at: at,
            updated_at: at,
        }
    }

    /// Parses the payload into a [`Value`].
    pub fn data_value(&self) -> DocumentStoreResult<Value> {
        Ok(serde_json::from_str(self.data.get())?)
    }
}

/// Validates that `data` is well-formed JSON and captures it verbatim.
///
/// Any JSON value is accepted, not only objects. Surrounding whitespace is dropped.
///
/// # Errors
///
/// Returns `InvalidPayload` if `data` is not a single well-formed JSON value.
pub fn parse_payload(data: &[u8]) -> DocumentStoreResult<Box<RawValue>> {
    serde_json::from_slice::<Box<RawValue>>(data)
        .map_err(|e| DocumentStoreError::InvalidPayload(format!("invalid JSON data: {e}")))
}

/// Document operations on one collection.
///
/// Obtained from [`DocumentStore::documents`](crate::store::DocumentStore::documents).
/// The handle itself does not check that the collection exists; each operation
/// documents how it treats a missing collection.
#[derive(Debug)]
pub struct Documents<'a, B: StoreBackend> {
    collection: String,
    backend: &'a B,
    ids: &'a IdGenerator,
}

impl<'a, B: StoreBackend> Documents<'a, B> {
    pub(crate) fn new(collection: String, backend: &'a B, ids: &'a IdGenerator) -> Self {
        Self { collection, backend, ids }
    }

    /// Returns the name of the collection this handle operates on.
    pub fn collection_name(&self) -> &str {
        &self.collection
    }

    /// Creates a document with a generated ID.
    ///
    /// If the collection does not exist yet it is created in the same write.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPayload` if `data` is not well-formed JSON and
    /// `InvalidCollectionName` if the collection name is empty.
    pub async fn create(&self, data: &[u8]) -> DocumentStoreResult<Document> {
        validate_collection_name(&self.collection)?;
        let payload = parse_payload(data)?;

        let now = Utc::now();
        let id = self.ids.generate(payload.get().as_bytes(), &now);
        let document = Document::new(id, self.collection.as_str(), payload, now);

        let mut batch = WriteBatch::with_capacity(3);
        batch
            .ensure_collection(Collection::new_at(self.collection.as_str(), now))
            .insert_document(document.clone())
            .touch_collection(&self.collection, now);
        self.backend.commit(batch).await?;

        debug!(collection = %self.collection, id = %document.id, "created document");
        Ok(document)
    }

    /// Creates a document under a client-supplied ID.
    ///
    /// Unlike [`create`](Self::create), the collection must already exist.
    ///
    /// # Errors
    ///
    /// Returns `CollectionNotFound` if the collection does not exist,
    /// `DocumentAlreadyExists` if the ID is taken in this collection, and
    /// `InvalidPayload` for an empty ID or malformed JSON.
    pub async fn create_with_id(&self, id: &str, data: &[u8]) -> DocumentStoreResult<Document> {
        if !self.backend.collection_exists(&self.collection).await? {
            return Err(DocumentStoreError::CollectionNotFound(self.collection.clone()));
        }
        if self.backend.document_exists(id, &self.collection).await? {
            return Err(DocumentStoreError::DocumentAlreadyExists(
                id.to_string(),
                self.collection.clone(),
            ));
        }
        if id.is_empty() {
            return Err(DocumentStoreError::InvalidPayload(
                "document ID cannot be empty".to_string(),
            ));
        }
        let payload = parse_payload(data)?;

        let now = Utc::now();
        let document = Document::new(id, self.collection.as_str(), payload, now);

        let mut batch = WriteBatch::with_capacity(2);
        batch
            .insert_document(document.clone())
            .touch_collection(&self.collection, now);
        self.backend.commit(batch).await?;

        debug!(collection = %self.collection, id, "created document with explicit id");
        Ok(document)
    }

    /// Fetches a document by ID.
    ///
    /// # Errors
    ///
    /// Returns `DocumentNotFound` if it does not exist.
    pub async fn get(&self, id: &str) -> DocumentStoreResult<Document> {
        self.backend
            .get_document(id, &self.collection)
            .await?
            .ok_or_else(|| {
                DocumentStoreError::DocumentNotFound(id.to_string(), self.collection.clone())
            })
    }

    /// Returns whether a document with this ID exists in the collection.
    pub async fn exists(&self, id: &str) -> DocumentStoreResult<bool> {
        self.backend.document_exists(id, &self.collection).await
    }

    /// Replaces a document's data.
    ///
    /// The returned document is read back after the write is committed, so it carries
    /// the timestamps the backend actually stored.
    ///
    /// # Errors
    ///
    /// Returns `DocumentNotFound` if it does not exist and `InvalidPayload` if `data`
    /// is not well-formed JSON.
    pub async fn update(&self, id: &str, data: &[u8]) -> DocumentStoreResult<Document> {
        if !self.backend.document_exists(id, &self.collection).await? {
            return Err(DocumentStoreError::DocumentNotFound(
                id.to_string(),
                self.collection.clone(),
            ));
        }
        let payload = parse_payload(data)?;

        let now = Utc::now();
        let mut batch = WriteBatch::with_capacity(2);
        batch
            .update_document(id, &self.collection, payload, now)
            .touch_collection(&self.collection, now);
        self.backend.commit(batch).await?;

        debug!(collection = %self.collection, id, "updated document");
        self.get(id).await
    }

    /// Deletes a document.
    ///
    /// # Errors
    ///
    /// Returns `DocumentNotFound` if it does not exist.
    pub async fn delete(&self, id: &str) -> DocumentStoreResult<()> {
        let mut batch = WriteBatch::with_capacity(2);
        batch
            .delete_document(id, &self.collection)
            .touch_collection(&self.collection, Utc::now());
        self.backend.commit(batch).await?;

        debug!(collection = %self.collection, id, "deleted document");
        Ok(())
    }

    /// Lists one page of the collection's documents, newest first.
    ///
    /// The page's `total` is the number of documents in the whole collection.
    ///
    /// # Errors
    ///
    /// Returns `CollectionNotFound` if the collection does not exist.
    pub async fn list(&self, query: &DocumentQuery) -> DocumentStoreResult<DocumentList> {
        if !self.backend.collection_exists(&self.collection).await? {
            return Err(DocumentStoreError::CollectionNotFound(self.collection.clone()));
        }

        let total = self.backend.count_documents(&self.collection).await?;
        let documents = self
            .backend
            .list_documents(&self.collection, query.limit, query.offset)
            .await?;

        Ok(DocumentList::new(total, query, documents))
    }

    /// Inserts a batch of documents atomically, each with a generated ID.
    ///
    /// The whole batch is one write: every item is validated before anything is
    /// written, all documents are inserted together and the collection is touched
    /// once. If any item is malformed or the backend fails part way, nothing from the
    /// batch is stored. The collection must already exist.
    ///
    /// # Errors
    ///
    /// Returns `CollectionNotFound` if the collection does not exist, and
    /// `InvalidPayload` naming the first malformed item.
    pub async fn bulk_create<I, T>(&self, items: I) -> DocumentStoreResult<Vec<Document>>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        if !self.backend.collection_exists(&self.collection).await? {
            return Err(DocumentStoreError::CollectionNotFound(self.collection.clone()));
        }

        let documents = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                let payload = parse_payload(item.as_ref()).map_err(|e| match e {
                    DocumentStoreError::InvalidPayload(reason) => {
                        DocumentStoreError::InvalidPayload(format!("item {index}: {reason}"))
                    }
                    other => other,
                })?;
                let now = Utc::now();
                let id = self.ids.generate(payload.get().as_bytes(), &now);

                Ok(Document::new(id, self.collection.as_str(), payload, now))
            })
            .collect::<DocumentStoreResult<Vec<Document>>>()?;

        let mut batch = WriteBatch::with_capacity(documents.len() + 1);
        for document in &documents {
            batch.insert_document(document.clone());
        }
        batch.touch_collection(&self.collection, Utc::now());

        if let Err(e) = self.backend.commit(batch).await {
            warn!(
                collection = %self.collection,
                items = documents.len(),
                error = %e,
                "bulk insert rolled back"
            );
            return Err(e);
        }

        debug!(collection = %self.collection, items = documents.len(), "bulk inserted documents");
        Ok(documents)
    }

    /// Normalizes an uploaded payload and bulk inserts the result.
    ///
    /// See [`ingest::normalize`] for the accepted shapes.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPayload` if the upload is neither a JSON array nor a JSON
    /// object, plus every error of [`bulk_create`](Self::bulk_create).
    pub async fn import(&self, raw: &[u8]) -> DocumentStoreResult<Vec<Document>> {
        let items = ingest::normalize(raw)?;

        self.bulk_create(items).await
    }
}
