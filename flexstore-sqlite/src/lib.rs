//! SQLite document storage backend for flexstore.
//!
//! This crate provides a durable implementation of the `StoreBackend` trait on a
//! bundled SQLite. Collections and documents live in two relations, with documents
//! referencing their collection so deleting a collection cascades to its documents.
//!
//! # Quick Start
//!
//! ```ignore
//! use flexstore::{prelude::*, sqlite::{SqliteStore, SqliteStoreConfig}};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = SqliteStore::builder(SqliteStoreConfig::new("data/db.sqlite"))
//!         .build()
//!         .await?;
//!     let store = DocumentStore::new(backend);
//!
//!     store.collections().create("users").await?;
//!     store.shutdown().await?;
//!
//!     Ok(())
//! }
//! ```

mod codec;
pub mod config;
mod schema;
pub mod store;

pub use config::{SqliteJournalMode, SqliteStoreConfig};
pub use store::{SqliteStore, SqliteStoreBuilder};
