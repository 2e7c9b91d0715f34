//! Main document store interface.
//!
//! [`DocumentStore`] owns a backend and hands out the two stores that operate on it:
//!
//! - [`Collections`] - collection management
//! - [`Documents`] - document operations scoped to one collection
//!
//! A store is generic over its backend. When the backend is only chosen at runtime
//! (for example from configuration), convert it with [`IntoDynDocumentStore`] into a
//! [`DynDocumentStore`], which is cheap to clone and share between tasks.
//!
//! # Example
//!
//! ```ignore
//! use flexstore::store::{DocumentStore, IntoDynDocumentStore};
//! use flexstore::memory::InMemoryStore;
//!
//! let store = DocumentStore::new(InMemoryStore::new()).into_dyn();
//! store.collections().create("users").await?;
//! store.documents("users").create(br#"{"name":"Alice"}"#).await?;
//! ```

use std::sync::Arc;

use tracing::info;

use crate::{
    backend::{DynStoreBackend, StoreBackend},
    collection::Collections,
    document::Documents,
    error::DocumentStoreResult,
    id::IdGenerator,
};

/// A document store bound to a specific backend implementation.
///
/// # Type Parameters
///
/// * `B` - The backend implementation type
#[derive(Debug, Clone)]
pub struct DocumentStore<B: StoreBackend> {
    backend: B,
    ids: Arc<IdGenerator>,
}

impl<B: StoreBackend> DocumentStore<B> {
    /// Creates a new document store over an initialized backend.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            ids: Arc::new(IdGenerator::new()),
        }
    }

    /// The underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Collection management operations.
    pub fn collections(&self) -> Collections<'_, B> {
        Collections::new(&self.backend)
    }

    /// Document operations on the collection named `name`.
    ///
    /// The collection does not have to exist yet.
    pub fn documents(&self, name: &str) -> Documents<'_, B> {
        Documents::new(name.to_string(), &self.backend, &self.ids)
    }

    /// Shuts down the store and releases backend resources.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to shut down cleanly.
    pub async fn shutdown(self) -> DocumentStoreResult<()> {
        self.backend.shutdown().await?;

        info!("document store shut down");
        Ok(())
    }
}

/// A document store over a backend selected at runtime.
pub type DynDocumentStore = DocumentStore<DynStoreBackend>;

/// Conversion of a store into a [`DynDocumentStore`].
pub trait IntoDynDocumentStore {
    fn into_dyn(self) -> DynDocumentStore;
}

impl<B: StoreBackend + 'static> IntoDynDocumentStore for DocumentStore<B> {
    fn into_dyn(self) -> DynDocumentStore {
        DocumentStore {
            backend: Arc::new(self.backend),
            ids: self.ids,
        }
    }
}
