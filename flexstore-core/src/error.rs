//! Error types and result types for document store operations.
//!
//! Every fallible operation in the workspace returns [`DocumentStoreResult<T>`].
//! Variants carry enough context (which collection, which document) for the
//! caller to report the failure; [`DocumentStoreError::kind`] collapses them
//! into the four categories an outer layer needs to pick a response.

use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with a document store.
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    /// The requested collection does not exist in the store.
    #[error("Collection '{0}' not found")]
    CollectionNotFound(String),
    /// A collection with the given name already exists.
    #[error("Collection '{0}' already exists")]
    CollectionAlreadyExists(String),
    /// The requested document was not found in the collection.
    /// The first argument is the document ID, the second is the collection name.
    #[error("Document with ID '{0}' not found in collection '{1}'")]
    DocumentNotFound(String, String),
    /// A document with the given ID already exists in the collection.
    /// The first argument is the document ID, the second is the collection name.
    #[error("Document with ID '{0}' already exists in collection '{1}'")]
    DocumentAlreadyExists(String, String),
    /// The collection name is not acceptable (for example, empty).
    #[error("Invalid collection name: {0}")]
    InvalidCollectionName(String),
    /// The payload is not well-formed JSON, or an upload could not be interpreted.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
    /// An error occurred in the underlying storage backend.
    #[error("Storage error: {0}")]
    Storage(String),
    /// Error during store initialization or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
}

/// Coarse classification of a [`DocumentStoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A collection or document is absent.
    NotFound,
    /// A duplicate collection name or document ID.
    AlreadyExists,
    /// Malformed JSON, a malformed upload or an unusable name.
    InvalidPayload,
    /// Backend I/O or transaction failure.
    StorageFailure,
}

impl DocumentStoreError {
    /// Returns the category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CollectionNotFound(_) | Self::DocumentNotFound(..) => ErrorKind::NotFound,
            Self::CollectionAlreadyExists(_) | Self::DocumentAlreadyExists(..) => {
                ErrorKind::AlreadyExists
            }
            Self::InvalidCollectionName(_) | Self::InvalidPayload(_) => ErrorKind::InvalidPayload,
            Self::Storage(_) | Self::Initialization(_) => ErrorKind::StorageFailure,
        }
    }

    /// Wraps any displayable backend error as a [`DocumentStoreError::Storage`],
    /// prefixed with the operation that failed.
    pub fn storage(context: &str, err: impl std::fmt::Display) -> Self {
        Self::Storage(format!("{context}: {err}"))
    }

    /// Returns `true` if this error reports a missing collection or document.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

/// A specialized `Result` type for document store operations.
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

impl From<SerdeJsonError> for DocumentStoreError {
    fn from(err: SerdeJsonError) -> Self {
        DocumentStoreError::InvalidPayload(err.to_string())
    }
}
