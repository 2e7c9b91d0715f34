//! HTTP front end for the flexstore document store.
//!
//! The server exposes collections and documents as a JSON API on top of a
//! [`DynDocumentStore`], so the storage backend (SQLite or in-memory) is chosen
//! from [`ServerConfig`] at startup.
//!
//! Every response uses the same envelope:
//!
//! ```json
//! {"status": "success", "data": {...}, "meta": {"total": 3, "limit": 100, "offset": 0}}
//! {"status": "error", "error": {"code": "COLLECTION_NOT_FOUND", "message": "..."}}
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod response;
pub mod router;
pub mod state;

use flexstore::{
    backend::StoreBackendBuilder,
    error::DocumentStoreError,
    memory::InMemoryStore,
    sqlite::{SqliteStore, SqliteStoreConfig},
    store::{DocumentStore, DynDocumentStore, IntoDynDocumentStore},
};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub use config::ServerConfig;
pub use router::router;
pub use state::AppState;

/// Failures that stop the server.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Store(#[from] DocumentStoreError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Opens the backend selected by `config`.
pub async fn open_store(config: &ServerConfig) -> Result<DynDocumentStore, ServerError> {
    if config.memory {
        info!("using in-memory storage");
        let backend = InMemoryStore::builder().build().await?;
        return Ok(DocumentStore::new(backend).into_dyn());
    }

    let sqlite = SqliteStoreConfig::new(config.sqlite_path.clone())
        .with_busy_timeout_ms(config.busy_timeout_ms)
        .with_read_connections(config.read_connections);
    info!(path = %config.sqlite_path.display(), "using sqlite storage");
    let backend = SqliteStore::builder(sqlite).build().await?;

    Ok(DocumentStore::new(backend).into_dyn())
}

/// Serves the API until Ctrl-C, then shuts the backend down.
pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let store = open_store(&config).await?;
    let state = AppState::new(store.clone(), config.credentials());
    let app = router(state, config.max_upload_bytes);

    let listener = TcpListener::bind(config.addr).await?;
    info!(
        addr = %listener.local_addr()?,
        auth = config.auth,
        version = state::VERSION,
        "server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped, closing store");
    store.shutdown().await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for ctrl-c, shutting down");
    }
}
