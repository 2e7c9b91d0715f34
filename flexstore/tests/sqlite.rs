#[macro_use]
mod common;

use flexstore::{
    prelude::*,
    sqlite::{SqliteStore, SqliteStoreConfig},
};
use tempfile::TempDir;

async fn open() -> (DocumentStore<SqliteStore>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let backend = SqliteStore::builder(SqliteStoreConfig::new(dir.path().join("db.sqlite")))
        .build()
        .await
        .unwrap();

    (DocumentStore::new(backend), dir)
}

backend_tests!(open);

#[tokio::test]
async fn documents_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = SqliteStoreConfig::new(dir.path().join("db.sqlite")).with_read_connections(2);

    let store = DocumentStore::new(SqliteStore::builder(config.clone()).build().await.unwrap());
    let created = store.documents("users").create(br#"{"name":"Alice"}"#).await.unwrap();
    store.shutdown().await.unwrap();

    let reopened = DocumentStore::new(SqliteStore::builder(config).build().await.unwrap());
    let fetched = reopened.documents("users").get(&created.id).await.unwrap();

    assert_eq!(fetched.data.get(), r#"{"name":"Alice"}"#);
    assert_eq!(fetched.created_at, created.created_at);
}

#[tokio::test]
async fn in_memory_databases_read_through_the_writer() {
    let backend = SqliteStore::builder(SqliteStoreConfig::in_memory())
        .build()
        .await
        .unwrap();
    let store = DocumentStore::new(backend);

    store.collections().create("users").await.unwrap();

    assert!(store.collections().exists("users").await.unwrap());
}

#[tokio::test]
async fn concurrent_writers_are_serialized() {
    let (store, _dir) = open().await;
    let store = store.into_dyn();
    store.collections().create("counters").await.unwrap();

    let tasks = (0..16)
        .map(|n| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .documents("counters")
                    .create(format!(r#"{{"n":{n}}}"#).as_bytes())
                    .await
            })
        })
        .collect::<Vec<_>>();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let page = store
        .documents("counters")
        .list(&DocumentQuery::default())
        .await
        .unwrap();
    assert_eq!(page.total, 16);
}
