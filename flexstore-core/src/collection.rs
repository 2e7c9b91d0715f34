//! Collections: named, independent namespaces of documents.
//!
//! This module provides the [`Collection`] record and the [`Collections`] handle,
//! which manages collection identity, existence checks and the "touch" that keeps
//! a collection's `updated_at` in step with activity on its documents.
//!
//! # Example
//!
//! ```ignore
//! use flexstore::{store::DocumentStore, memory::InMemoryStore};
//!
//! let store = DocumentStore::new(InMemoryStore::new());
//!
//! let users = store.collections().create("users").await?;
//! assert_eq!(users.created_at, users.updated_at);
//!
//! let listing = store.collections().list().await?;
//! assert_eq!(listing.total, 1);
//! # Ok::<(), flexstore::error::DocumentStoreError>(())
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    backend::{StoreBackend, WriteOp},
    error::{DocumentStoreError, DocumentStoreResult},
    page::CollectionList,
};

/// A named collection of documents.
///
/// The name is the collection's identity: it is user supplied, case sensitive, unique
/// across the store and never empty. `updated_at` is never earlier than `created_at`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Collection {
    /// Creates a collection record stamped with the current time.
    pub fn new(name: impl Into<String>) -> Self {
        Self::new_at(name, Utc::now())
    }

    /// Creates a collection record with `created_at == updated_at == at`.
    pub fn new_at(name: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            created_at: at,
            updated_at: at,
        }
    }

    /// Advances `updated_at` to `at`, keeping it if it is already later.
    pub fn touch(&mut self, at: DateTime<Utc>) {
        if at > self.updated_at {
            self.updated_at = at;
        }
    }
}

/// Checks that `name` can identify a collection.
pub fn validate_collection_name(name: &str) -> DocumentStoreResult<()> {
    if name.is_empty() {
        return Err(DocumentStoreError::InvalidCollectionName(
            "collection name cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Collection management operations against a storage backend.
///
/// Obtained from [`DocumentStore::collections`](crate::store::DocumentStore::collections).
#[derive(Debug)]
pub struct Collections<'a, B: StoreBackend> {
    backend: &'a B,
}

impl<'a, B: StoreBackend> Collections<'a, B> {
    pub(crate) fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Creates a new, empty collection.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCollectionName` for an empty name and `CollectionAlreadyExists`
    /// if the name is taken.
    pub async fn create(&self, name: &str) -> DocumentStoreResult<Collection> {
        validate_collection_name(name)?;

        if self.backend.collection_exists(name).await? {
            return Err(DocumentStoreError::CollectionAlreadyExists(name.to_string()));
        }

        let collection = Collection::new(name);
        self.backend
            .execute(WriteOp::InsertCollection(collection.clone()))
            .await?;

        debug!(collection = name, "created collection");
        Ok(collection)
    }

    /// Fetches a collection by name.
    ///
    /// # Errors
    ///
    /// Returns `CollectionNotFound` if it does not exist.
    pub async fn get(&self, name: &str) -> DocumentStoreResult<Collection> {
        self.backend
            .get_collection(name)
            .await?
            .ok_or_else(|| DocumentStoreError::CollectionNotFound(name.to_string()))
    }

    /// Returns whether the collection exists. Absence is not an error here.
    pub async fn exists(&self, name: &str) -> DocumentStoreResult<bool> {
        self.backend.collection_exists(name).await
    }

    /// Deletes a collection together with every document it contains.
    ///
    /// # Errors
    ///
    /// Returns `CollectionNotFound` if it does not exist.
    pub async fn delete(&self, name: &str) -> DocumentStoreResult<()> {
        self.backend
            .execute(WriteOp::DeleteCollection { name: name.to_string() })
            .await?;

        debug!(collection = name, "deleted collection");
        Ok(())
    }

    /// Lists every collection in ascending name order, with the total count.
    pub async fn list(&self) -> DocumentStoreResult<CollectionList> {
        Ok(CollectionList::new(self.backend.list_collections().await?))
    }

    /// Number of collections in the store.
    pub async fn count(&self) -> DocumentStoreResult<usize> {
        self.backend.count_collections().await
    }

    /// Refreshes the collection's `updated_at` to now and returns the stored record.
    ///
    /// Document mutations touch their collection as part of their own write; this is
    /// the standalone form of the same operation.
    ///
    /// # Errors
    ///
    /// Returns `CollectionNotFound` if it does not exist.
    pub async fn touch(&self, name: &str) -> DocumentStoreResult<Collection> {
        self.backend
            .execute(WriteOp::TouchCollection {
                name: name.to_string(),
                at: Utc::now(),
            })
            .await?;

        self.get(name).await
    }
}
