//! In-memory document storage backend for flexstore.
//!
//! This crate provides a thread-safe, volatile implementation of the `StoreBackend`
//! trait. It keeps the same semantics as the durable backends, including atomic
//! write batches, which makes it the backend of choice for development and tests.
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
//!     let note = store.documents("notes").create(br#"{"text":"hello"}"#).await?;
//!     println!("stored {}", note.id);
//!
//!     Ok(())
//! }
//! ```

pub mod store;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
