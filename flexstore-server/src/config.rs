//! Command-line and environment configuration.

use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;
use flexstore::sqlite::{DEFAULT_BUSY_TIMEOUT_MS, DEFAULT_READ_CONNECTIONS};

use crate::auth::Credentials;

/// Largest accepted upload body: 10 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Server settings. Every flag can also be set through its environment variable.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "flexstore-server",
    version,
    about = "Schemaless JSON document store over HTTP"
)]
pub struct ServerConfig {
    /// Address to listen on.
    #[arg(long, env = "FLEXSTORE_ADDR", default_value = "0.0.0.0:8080")]
    pub addr: SocketAddr,

    /// SQLite database file. Parent directories are created on start.
    #[arg(long, env = "FLEXSTORE_SQLITE_PATH", default_value = "data/db.sqlite")]
    pub sqlite_path: PathBuf,

    /// Keep everything in memory instead of SQLite. Data is lost on exit.
    #[arg(long, env = "FLEXSTORE_MEMORY")]
    pub memory: bool,

    /// Require HTTP Basic Auth on the protected endpoints.
    #[arg(long, env = "FLEXSTORE_AUTH")]
    pub auth: bool,

    #[arg(long, env = "FLEXSTORE_USERNAME", default_value = "admin")]
    pub username: String,

    #[arg(
        long,
        env = "FLEXSTORE_PASSWORD",
        default_value = "password",
        hide_env_values = true,
        hide_default_value = true
    )]
    pub password: String,

    /// Read-only SQLite connections opened next to the writer.
    #[arg(long, env = "FLEXSTORE_READ_CONNECTIONS", default_value_t = DEFAULT_READ_CONNECTIONS)]
    pub read_connections: usize,

    /// How long a SQLite connection waits on a locked database.
    #[arg(long, env = "FLEXSTORE_BUSY_TIMEOUT_MS", default_value_t = DEFAULT_BUSY_TIMEOUT_MS)]
    pub busy_timeout_ms: u64,

    /// Body size limit for uploads, in bytes.
    #[arg(long, env = "FLEXSTORE_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,

    /// Emit logs as JSON lines.
    #[arg(long, env = "FLEXSTORE_LOG_JSON")]
    pub log_json: bool,
}

impl ServerConfig {
    /// The credentials protected routes check, or `None` when auth is off.
    pub fn credentials(&self) -> Option<Credentials> {
        self.auth
            .then(|| Credentials::new(self.username.clone(), self.password.clone()))
    }
}
