//! Convenient re-exports of commonly used types from flexstore.
//!
//! ```ignore
//! use flexstore::prelude::*;
//! ```

pub use flexstore_core::{
    backend::{DynStoreBackend, StoreBackend, StoreBackendBuilder, WriteBatch, WriteOp},
    collection::{Collection, Collections},
    document::{Document, Documents},
    error::{DocumentStoreError, DocumentStoreResult, ErrorKind},
    page::{CollectionList, DocumentList},
    query::DocumentQuery,
    store::{DocumentStore, DynDocumentStore, IntoDynDocumentStore},
};
