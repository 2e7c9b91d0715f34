//! Relations backing the SQLite store.

use rusqlite::Connection;

/// Creates both relations if they do not exist yet. Safe to run on every start.
pub(crate) const CREATE_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS collections (
    name TEXT NOT NULL PRIMARY KEY,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS documents (
    id TEXT NOT NULL,
    collection_name TEXT NOT NULL,
    data TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (id, collection_name),
    FOREIGN KEY (collection_name) REFERENCES collections(name) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_documents_collection_created
    ON documents (collection_name, created_at);
";

pub(crate) fn initialize_schema(connection: &mut Connection) -> rusqlite::Result<()> {
    let tx = connection.transaction()?;
    tx.execute_batch(CREATE_SCHEMA)?;

    tx.commit()
}
