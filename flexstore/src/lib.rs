//! Main flexstore crate: a schemaless JSON document store.
//!
//! This crate is the primary entry point. It re-exports the core types and gives
//! access to the storage backends.
//!
//! # Features
//!
//! - **Schemaless documents** - Any well-formed JSON payload, returned exactly as stored
//! - **Collections** - Named namespaces, created explicitly or on first write
//! - **Atomic bulk loading** - All-or-nothing multi-document inserts, plus normalization of uploads
//! - **Multiple backends** - Volatile in-memory storage and durable SQLite storage
//!
//! # Quick Start
//!
//! ```ignore
//! use flexstore::{prelude::*, memory::InMemoryStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = DocumentStore::new(InMemoryStore::builder().build().await?);
//!
//!     // Writing to an unknown collection creates it
//!     let users = store.documents("users");
//!     let alice = users.create(br#"{"name":"Alice","age":30}"#).await?;
//!
//!     // Documents come back byte for byte
//!     assert_eq!(users.get(&alice.id).await?.data.get(), r#"{"name":"Alice","age":30}"#);
//!
//!     // Bulk inserts are atomic
//!     users.bulk_create([&br#"{"name":"Bob"}"#[..], br#"{"name":"Carol"}"#]).await?;
//!
//!     let page = users.list(&DocumentQuery::builder().limit(2).build()).await?;
//!     println!("{} of {} users", page.documents.len(), page.total);
//!
//!     store.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Dynamic Dispatch
//!
//! When the backend is chosen at runtime, convert the store with
//! [`into_dyn`](store::IntoDynDocumentStore::into_dyn). The resulting
//! [`DynDocumentStore`](store::DynDocumentStore) is cheap to clone into request
//! handlers.
//!
//! ```ignore
//! use flexstore::{prelude::*, memory::InMemoryStore, sqlite::{SqliteStore, SqliteStoreConfig}};
//!
//! let store: DynDocumentStore = if use_memory {
//!     DocumentStore::new(InMemoryStore::new()).into_dyn()
//! } else {
//!     let backend = SqliteStore::builder(SqliteStoreConfig::new("data/db.sqlite")).build().await?;
//!     DocumentStore::new(backend).into_dyn()
//! };
//! ```
//!
//! # Backends
//!
//! - [`memory`] - Fast in-memory storage for development and testing
//! - [`sqlite`] - Persistent SQLite backend (requires the `sqlite` feature, on by default)

pub mod prelude;

pub use flexstore_core::{backend, collection, document, error, id, ingest, page, query, store};

// Re-export JSON types for convenience
pub use serde_json;

/// In-memory storage backend implementations.
pub mod memory {
    pub use flexstore_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// SQLite storage backend implementations.
///
/// This module is only available when the `sqlite` feature is enabled.
#[cfg(feature = "sqlite")]
pub mod sqlite {
    pub use flexstore_sqlite::{
        SqliteJournalMode, SqliteStore, SqliteStoreBuilder, SqliteStoreConfig,
        config::{DEFAULT_BUSY_TIMEOUT_MS, DEFAULT_READ_CONNECTIONS},
    };
}
