//! Behaviour every backend must share. Each backend's test file pulls this in with
//! `#[macro_use] mod common;` and instantiates the checks with `backend_tests!`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use flexstore::prelude::*;

/// Expands to one `#[tokio::test]` per check below. `$open` is an async function
/// returning the store under test and a guard that keeps its storage alive.
macro_rules! backend_tests {
    ($open:path) => {
        backend_tests!(
            $open;
            collection_names_are_unique,
            empty_collection_names_are_rejected,
            missing_collections_are_not_found,
            collections_list_in_name_order,
            explicit_ids_are_unique_per_collection,
            only_generated_ids_create_the_collection,
            empty_explicit_ids_are_rejected,
            deleting_a_collection_deletes_its_documents,
            document_mutations_touch_the_collection,
            update_returns_the_stored_document,
            missing_documents_are_not_found,
            malformed_payloads_are_rejected,
            bulk_create_is_all_or_nothing,
            bulk_create_requires_the_collection,
            bulk_create_inserts_every_item,
            listing_pages_newest_first,
            listing_a_missing_collection_fails,
            payloads_round_trip_verbatim,
            uploads_are_normalized_before_insert,
        );
    };
    ($open:path; $($check:ident),+ $(,)?) => {
        $(
            #[tokio::test]
            async fn $check() {
                let (store, _guard) = $open().await;
                common::$check(&store).await;
            }
        )+
    };
}

async fn updated_at<B: StoreBackend>(store: &DocumentStore<B>, name: &str) -> DateTime<Utc> {
    store.collections().get(name).await.unwrap().updated_at
}

/// Lets the clock advance so consecutive timestamps differ.
async fn tick() {
    tokio::time::sleep(Duration::from_millis(2)).await;
}

pub async fn collection_names_are_unique<B: StoreBackend>(store: &DocumentStore<B>) {
    let users = store.collections().create("users").await.unwrap();
    assert_eq!(users.created_at, users.updated_at);

    let err = store.collections().create("users").await.unwrap_err();
    assert!(matches!(
        err,
        DocumentStoreError::CollectionAlreadyExists(ref name) if name == "users"
    ));
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);

    // Names are case sensitive.
    store.collections().create("Users").await.unwrap();
    assert_eq!(store.collections().count().await.unwrap(), 2);
}

pub async fn empty_collection_names_are_rejected<B: StoreBackend>(store: &DocumentStore<B>) {
    let err = store.collections().create("").await.unwrap_err();
    assert!(matches!(err, DocumentStoreError::InvalidCollectionName(_)));

    let err = store.documents("").create(b"{}").await.unwrap_err();
    assert!(matches!(err, DocumentStoreError::InvalidCollectionName(_)));
    assert_eq!(store.collections().count().await.unwrap(), 0);
}

pub async fn missing_collections_are_not_found<B: StoreBackend>(store: &DocumentStore<B>) {
    let collections = store.collections();

    assert!(!collections.exists("ghost").await.unwrap());
    assert!(collections.get("ghost").await.unwrap_err().is_not_found());
    assert!(collections.delete("ghost").await.unwrap_err().is_not_found());
    assert!(collections.touch("ghost").await.unwrap_err().is_not_found());
}

pub async fn collections_list_in_name_order<B: StoreBackend>(store: &DocumentStore<B>) {
    for name in ["orders", "accounts", "Zebra", "users"] {
        store.collections().create(name).await.unwrap();
    }

    let listing = store.collections().list().await.unwrap();
    let names = listing
        .collections
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>();

    assert_eq!(listing.total, 4);
    assert_eq!(names, vec!["Zebra", "accounts", "orders", "users"]);
}

pub async fn explicit_ids_are_unique_per_collection<B: StoreBackend>(store: &DocumentStore<B>) {
    store.collections().create("users").await.unwrap();
    store.collections().create("orders").await.unwrap();

    let created = store
        .documents("users")
        .create_with_id("x", br#"{"v":1}"#)
        .await
        .unwrap();
    assert_eq!(created.id, "x");

    let err = store
        .documents("users")
        .create_with_id("x", br#"{"v":2}"#)
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentStoreError::DocumentAlreadyExists(..)));
    assert_eq!(store.documents("users").get("x").await.unwrap().data.get(), r#"{"v":1}"#);

    // The same ID is free in another collection.
    store
        .documents("orders")
        .create_with_id("x", br#"{"v":3}"#)
        .await
        .unwrap();
}

pub async fn only_generated_ids_create_the_collection<B: StoreBackend>(store: &DocumentStore<B>) {
    let created = store.documents("newcoll").create(br#"{"a":1}"#).await.unwrap();
    assert_eq!(created.collection_name, "newcoll");
    assert!(store.collections().exists("newcoll").await.unwrap());

    let err = store
        .documents("newcoll2")
        .create_with_id("x", br#"{"a":1}"#)
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentStoreError::CollectionNotFound(ref name) if name == "newcoll2"));
    assert!(!store.collections().exists("newcoll2").await.unwrap());
}

pub async fn empty_explicit_ids_are_rejected<B: StoreBackend>(store: &DocumentStore<B>) {
    store.collections().create("users").await.unwrap();

    let err = store
        .documents("users")
        .create_with_id("", b"{}")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidPayload);
}

pub async fn deleting_a_collection_deletes_its_documents<B: StoreBackend>(
    store: &DocumentStore<B>,
) {
    let users = store.documents("users");
    let mut ids = Vec::new();
    for n in 0..3 {
        ids.push(users.create(format!(r#"{{"n":{n}}}"#).as_bytes()).await.unwrap().id);
    }
    store.documents("keep").create(b"{}").await.unwrap();

    store.collections().delete("users").await.unwrap();

    for id in &ids {
        let err = users.get(id).await.unwrap_err();
        assert!(matches!(err, DocumentStoreError::DocumentNotFound(..)));
    }
    assert!(!store.collections().exists("users").await.unwrap());

    // Recreating the name starts from an empty collection.
    store.collections().create("users").await.unwrap();
    let page = users.list(&DocumentQuery::default()).await.unwrap();
    assert_eq!(page.total, 0);

    let kept = store.documents("keep").list(&DocumentQuery::default()).await.unwrap();
    assert_eq!(kept.total, 1);
}

pub async fn document_mutations_touch_the_collection<B: StoreBackend>(store: &DocumentStore<B>) {
    let collection = store.collections().create("users").await.unwrap();
    let users = store.documents("users");

    tick().await;
    let document = users.create(br#"{"v":1}"#).await.unwrap();
    let after_create = updated_at(store, "users").await;
    assert!(after_create > collection.updated_at);

    tick().await;
    users.update(&document.id, br#"{"v":2}"#).await.unwrap();
    let after_update = updated_at(store, "users").await;
    assert!(after_update > after_create);

    tick().await;
    users.delete(&document.id).await.unwrap();
    let after_delete = updated_at(store, "users").await;
    assert!(after_delete > after_update);

    tick().await;
    let touched = store.collections().touch("users").await.unwrap();
    assert!(touched.updated_at > after_delete);
    assert_eq!(touched.created_at, collection.created_at);
}

pub async fn update_returns_the_stored_document<B: StoreBackend>(store: &DocumentStore<B>) {
    let users = store.documents("users");
    let created = users.create(br#"{"name":"Alice"}"#).await.unwrap();

    tick().await;
    let updated = users.update(&created.id, br#"{"name":"Alicia"}"#).await.unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.data.get(), r#"{"name":"Alicia"}"#);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at > created.updated_at);

    let fetched = users.get(&created.id).await.unwrap();
    assert_eq!(fetched.data.get(), updated.data.get());
    assert_eq!(fetched.updated_at, updated.updated_at);
}

pub async fn missing_documents_are_not_found<B: StoreBackend>(store: &DocumentStore<B>) {
    let collection = store.collections().create("users").await.unwrap();
    let users = store.documents("users");

    assert!(!users.exists("nope").await.unwrap());
    assert!(matches!(
        users.get("nope").await.unwrap_err(),
        DocumentStoreError::DocumentNotFound(..)
    ));
    assert!(matches!(
        users.update("nope", b"{}").await.unwrap_err(),
        DocumentStoreError::DocumentNotFound(..)
    ));
    assert!(matches!(
        users.delete("nope").await.unwrap_err(),
        DocumentStoreError::DocumentNotFound(..)
    ));

    // Failed mutations do not touch the collection.
    assert_eq!(updated_at(store, "users").await, collection.updated_at);
}

pub async fn malformed_payloads_are_rejected<B: StoreBackend>(store: &DocumentStore<B>) {
    let err = store.documents("users").create(b"not json").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidPayload);
    assert!(!store.collections().exists("users").await.unwrap());

    let users = store.documents("users");
    let document = users.create(br#"{"ok":true}"#).await.unwrap();
    let err = users.update(&document.id, b"{\"ok\":").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidPayload);
    assert_eq!(users.get(&document.id).await.unwrap().data.get(), r#"{"ok":true}"#);
}

pub async fn bulk_create_is_all_or_nothing<B: StoreBackend>(store: &DocumentStore<B>) {
    let users = store.documents("users");
    users.create(br#"{"seed":true}"#).await.unwrap();
    let before = updated_at(store, "users").await;

    tick().await;
    let err = users
        .bulk_create([&br#"{"a":1}"#[..], br#"{"b":2}"#, b"{broken", br#"{"c":3}"#])
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DocumentStoreError::InvalidPayload(ref reason) if reason.contains("item 2")
    ));
    let page = users.list(&DocumentQuery::default()).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(updated_at(store, "users").await, before);
}

pub async fn bulk_create_requires_the_collection<B: StoreBackend>(store: &DocumentStore<B>) {
    let err = store
        .documents("ghost")
        .bulk_create([br#"{"a":1}"#])
        .await
        .unwrap_err();

    assert!(matches!(err, DocumentStoreError::CollectionNotFound(_)));
    assert!(!store.collections().exists("ghost").await.unwrap());
}

pub async fn bulk_create_inserts_every_item<B: StoreBackend>(store: &DocumentStore<B>) {
    let collection = store.collections().create("events").await.unwrap();
    let events = store.documents("events");

    tick().await;
    let created = events
        .bulk_create(vec![br#"{"same":true}"#; 3])
        .await
        .unwrap();

    assert_eq!(created.len(), 3);
    assert_ne!(created[0].id, created[1].id);
    assert_ne!(created[1].id, created[2].id);
    assert_ne!(created[0].id, created[2].id);
    for document in &created {
        assert_eq!(events.get(&document.id).await.unwrap().data.get(), r#"{"same":true}"#);
    }
    assert!(updated_at(store, "events").await > collection.updated_at);

    let empty = events.bulk_create(Vec::<Vec<u8>>::new()).await.unwrap();
    assert!(empty.is_empty());
}

pub async fn listing_pages_newest_first<B: StoreBackend>(store: &DocumentStore<B>) {
    store.collections().create("items").await.unwrap();
    let items = store.documents("items");
    items
        .bulk_create((0..150).map(|n| format!(r#"{{"n":{n}}}"#)))
        .await
        .unwrap();

    let first = items
        .list(&DocumentQuery::builder().limit(100).offset(0).build())
        .await
        .unwrap();
    assert_eq!(first.total, 150);
    assert_eq!(first.documents.len(), 100);
    assert!(first.has_more());

    let second = items
        .list(&DocumentQuery::builder().limit(100).offset(100).build())
        .await
        .unwrap();
    assert_eq!(second.total, 150);
    assert_eq!(second.documents.len(), 50);
    assert!(!second.has_more());

    let all = first
        .documents
        .iter()
        .chain(&second.documents)
        .collect::<Vec<_>>();
    assert!(all.windows(2).all(|w| w[0].created_at >= w[1].created_at));

    let mut ids = all.iter().map(|d| d.id.as_str()).collect::<Vec<_>>();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 150);

    let beyond = items
        .list(&DocumentQuery::builder().offset(500).build())
        .await
        .unwrap();
    assert_eq!(beyond.total, 150);
    assert!(beyond.documents.is_empty());
}

pub async fn listing_a_missing_collection_fails<B: StoreBackend>(store: &DocumentStore<B>) {
    let err = store
        .documents("ghost")
        .list(&DocumentQuery::default())
        .await
        .unwrap_err();

    assert!(matches!(err, DocumentStoreError::CollectionNotFound(_)));
}

pub async fn payloads_round_trip_verbatim<B: StoreBackend>(store: &DocumentStore<B>) {
    let payloads = [
        r#"{"b": 1, "a": [1, 2.50, "x"]}"#,
        r#"{"nested":{"deep":{"deeper":[null,true,false]}}}"#,
        r#"{"name":"Zoë ✓","escaped":"line\nbreak"}"#,
        r#"[1,2,3]"#,
        r#""just a string""#,
        "42",
        "null",
    ];
    let notes = store.documents("notes");

    for payload in payloads {
        let created = notes.create(payload.as_bytes()).await.unwrap();
        let fetched = notes.get(&created.id).await.unwrap();

        assert_eq!(fetched.data.get(), payload);
        assert_eq!(fetched.collection_name, "notes");
        assert_eq!(fetched.created_at, created.created_at);
    }
}

pub async fn uploads_are_normalized_before_insert<B: StoreBackend>(store: &DocumentStore<B>) {
    store.collections().create("uploads").await.unwrap();
    let uploads = store.documents("uploads");

    let batch = uploads.import(br#"[{"a":1},{"b":2}]"#).await.unwrap();
    assert_eq!(batch.len(), 2);

    let raw = r#"{"z":1,"a":12345678901234567890123,"f":1.10}"#;
    let single = uploads.import(raw.as_bytes()).await.unwrap();
    assert_eq!(single.len(), 1);
    let stored = uploads.get(&single[0].id).await.unwrap();
    assert_eq!(stored.data.get(), raw);

    let err = uploads.import(b"not json").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidPayload);

    let page = uploads.list(&DocumentQuery::default()).await.unwrap();
    assert_eq!(page.total, 3);
}
