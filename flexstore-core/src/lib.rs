//! Core of the flexstore schemaless JSON document store.
//!
//! This crate provides everything except a concrete storage engine:
//!
//! - **Data model** ([`collection`], [`document`], [`page`]) - Collections, documents and
//!   listing results
//! - **Store backend abstraction** ([`backend`]) - The backend trait and its atomic write batches
//! - **Document store** ([`store`]) - Main interface handing out the collection and document stores
//! - **Pagination** ([`query`]) - Limit and offset for document listings
//! - **ID generation** ([`id`]) - Content-derived document IDs
//! - **Ingestion** ([`ingest`]) - Normalization of uploaded payloads into bulk batches
//! - **Error handling** ([`error`]) - Error taxonomy and result type
//!
//! # Example
//!
//! ```ignore
//! use flexstore_core::{query::DocumentQuery, store::DocumentStore};
//!
//! let store = DocumentStore::new(backend);
//! let orders = store.documents("orders");
//!
//! orders.create(br#"{"total": 12.5}"#).await?;
//! let page = orders.list(&DocumentQuery::default()).await?;
//! assert_eq!(page.total, 1);
//! ```

pub mod backend;
pub mod collection;
pub mod document;
pub mod error;
pub mod id;
pub mod ingest;
pub mod page;
pub mod query;
pub mod store;
