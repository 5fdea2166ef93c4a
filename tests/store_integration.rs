//! Integration tests for the note store.
//!
//! These tests exercise the store end to end:
//! - Insert, update, delete and lookup by id
//! - Batch inserts and cursors
//! - Identifier validation
//! - The stored document mapping
//!
//! Every property runs against the in-memory backend. The same suite runs
//! against a live server when `NOTEKEEP_TEST_URI` is set and ignored tests
//! are requested.

use std::collections::HashSet;
use std::time::Duration;

use notekeep::prelude::*;
use notekeep::store::document::{decode, encode};
use notekeep::store::{NoteField, Operation};
use pretty_assertions::assert_eq;

fn memory_store() -> NoteStore {
    NoteStore::with_backend(MemoryBackend::new("glottery", "notes"))
}

fn ctx() -> OpContext {
    OpContext::background().with_timeout(Duration::from_secs(10))
}

async fn insert_then_find(store: &NoteStore) {
    let id = store
        .insert_one(&ctx(), NewNote::new("First note", "Some spam text"))
        .await
        .unwrap();

    let note = store.find_by_id(&ctx(), id).await.unwrap();
    assert_eq!(note.id, id);
    assert_eq!(note.title, "First note");
    assert_eq!(note.body, "Some spam text");
    assert_eq!(note.updated_at, note.created_at);
}

async fn update_then_find(store: &NoteStore) {
    let id = store
        .insert_one(&ctx(), NewNote::new("First note", "Some spam text"))
        .await
        .unwrap();
    let before = store.find_by_id(&ctx(), id).await.unwrap();

    let outcome = store
        .update_by_id(&ctx(), id, NoteUpdate::new().body("Some updated text"))
        .await
        .unwrap();
    assert_eq!(outcome.matched, 1);

    let after = store.find_by_id(&ctx(), id).await.unwrap();
    assert_eq!(after.body, "Some updated text");
    assert_eq!(after.title, "First note");
    assert_eq!(after.created_at, before.created_at);
    assert!(after.updated_at > before.updated_at);
}

async fn delete_then_find(store: &NoteStore) {
    let id = store
        .insert_one(&ctx(), NewNote::new("Doomed", "Some spam text"))
        .await
        .unwrap();

    assert_eq!(store.delete_by_id(&ctx(), id).await.unwrap(), 1);
    let err = store.find_by_id(&ctx(), id).await.unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {err}");
}

async fn invalid_id_is_rejected(store: &NoteStore) {
    for raw in ["", "xyz", "0123456789abcdef0123456", "zzzzzzzzzzzzzzzzzzzzzzzz"] {
        let err = store.find_by_id(&ctx(), raw).await.unwrap_err();
        assert!(err.is_invalid_id(), "{raw:?}: {err}");
        assert!(!err.is_not_found());
    }

    let err = store
        .update_by_id(&ctx(), "xyz", NoteUpdate::new().body("x"))
        .await
        .unwrap_err();
    assert!(err.is_invalid_id());

    let err = store.delete_by_id(&ctx(), "xyz").await.unwrap_err();
    assert!(err.is_invalid_id());
}

async fn insert_many_returns_retrievable_ids(store: &NoteStore) {
    let ids = store
        .insert_many(
            &ctx(),
            vec![
                NewNote::new("Second note", "Some spam text"),
                NewNote::new("Third note", "Some spam text"),
            ],
        )
        .await
        .unwrap();
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);

    assert_eq!(store.find_by_id(&ctx(), ids[0]).await.unwrap().title, "Second note");
    assert_eq!(store.find_by_id(&ctx(), ids[1]).await.unwrap().title, "Third note");
}

async fn find_all_after_inserts_and_deletes(store: &NoteStore) {
    let start = store.count(&ctx(), NoteFilter::all()).await.unwrap();

    let k = 6;
    let notes = (0..k)
        .map(|i| NewNote::new(format!("note {i}"), "Some spam text"))
        .collect();
    let ids = store.insert_many(&ctx(), notes).await.unwrap();

    let d = 2;
    for id in &ids[..d] {
        assert_eq!(store.delete_by_id(&ctx(), *id).await.unwrap(), 1);
    }

    let found = store
        .find_all(&ctx(), NoteFilter::all().id_in(ids.iter().copied()))
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();
    let distinct: HashSet<NoteId> = found.iter().map(|note| note.id).collect();
    assert_eq!(found.len(), k - d);
    assert_eq!(distinct.len(), k - d);
    assert_eq!(
        store.count(&ctx(), NoteFilter::all()).await.unwrap(),
        start + (k - d) as u64
    );
}

async fn insert_many_rolls_back_on_duplicate(store: &NoteStore) {
    let existing = store
        .insert_one(&ctx(), NewNote::new("Existing", "Some spam text"))
        .await
        .unwrap();
    let fresh = NoteId::new();

    let err = store
        .insert_many(
            &ctx(),
            vec![
                NewNote::new("Fresh", "Some spam text").with_id(fresh),
                NewNote::new("Clash", "Some spam text").with_id(existing),
            ],
        )
        .await
        .unwrap_err();
    assert!(err.is_write_error());
    assert_eq!(err.operation(), Some(Operation::InsertMany));

    let err = store.find_by_id(&ctx(), fresh).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(store.find_by_id(&ctx(), existing).await.unwrap().title, "Existing");
}

async fn run_properties(store: &NoteStore) {
    insert_then_find(store).await;
    update_then_find(store).await;
    delete_then_find(store).await;
    invalid_id_is_rejected(store).await;
    insert_many_returns_retrievable_ids(store).await;
    find_all_after_inserts_and_deletes(store).await;
    insert_many_rolls_back_on_duplicate(store).await;
}

#[tokio::test]
async fn test_properties_in_memory() {
    let store = memory_store();
    run_properties(&store).await;
    store.close().await;
}

#[tokio::test]
async fn test_document_mapping_law() {
    let store = memory_store();
    let id = store
        .insert_one(&ctx(), NewNote::new("First note", "Some spam text"))
        .await
        .unwrap();
    store
        .update_by_id(&ctx(), id, NoteUpdate::new().title("Renamed"))
        .await
        .unwrap();

    let note = store.find_by_id(&ctx(), id).await.unwrap();
    let doc = encode(&note).unwrap();
    for (field, key) in NoteField::ALL.iter().map(|f| (f, f.document_key())) {
        assert!(doc.contains_key(key), "missing {key} for {field}");
    }
    assert_eq!(encode(&decode(doc.clone()).unwrap()).unwrap(), doc);
    assert_eq!(decode(doc).unwrap(), note);
}

#[tokio::test]
async fn test_walkthrough() {
    let store = memory_store();
    assert_eq!(store.database_name(), "glottery");
    assert_eq!(store.collection_name(), "notes");

    let first = store
        .insert_one(&ctx(), NewNote::new("First note", "Some spam text"))
        .await
        .unwrap();
    let batch = store
        .insert_many(
            &ctx(),
            vec![
                NewNote::new("Second note", "Some spam text"),
                NewNote::new("Third note", "Some spam text"),
            ],
        )
        .await
        .unwrap();

    store
        .update_by_id(&ctx(), first, NoteUpdate::new().body("Some updated text"))
        .await
        .unwrap();
    store.delete_by_id(&ctx(), batch[1]).await.unwrap();

    let note = store.find_by_id(&ctx(), first).await.unwrap();
    assert_eq!(note.body, "Some updated text");

    let titles: Vec<String> = store
        .find_all(&ctx(), NoteFilter::all())
        .await
        .unwrap()
        .collect()
        .await
        .unwrap()
        .into_iter()
        .map(|note| note.title)
        .collect();
    assert_eq!(titles, vec!["First note", "Second note"]);
}

#[tokio::test]
async fn test_filters_by_time() {
    let store = memory_store();
    let first = store
        .insert_one(&ctx(), NewNote::new("First note", "Some spam text"))
        .await
        .unwrap();
    let cutoff = store.find_by_id(&ctx(), first).await.unwrap().created_at;

    store
        .insert_one(&ctx(), NewNote::new("Second note", "Some spam text"))
        .await
        .unwrap();

    let later = store
        .find_all(&ctx(), NoteFilter::all().created_after(cutoff))
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();
    assert_eq!(later.len(), 1);
    assert_eq!(later[0].title, "Second note");

    let earlier = store
        .count(&ctx(), NoteFilter::all().created_before(cutoff + chrono::Duration::milliseconds(1)))
        .await
        .unwrap();
    assert_eq!(earlier, 1);
}

#[tokio::test]
async fn test_cancellation_token_aborts() {
    let store = memory_store();
    let token = tokio_util::sync::CancellationToken::new();
    let ctx = OpContext::background().with_cancellation(token.clone());

    store.insert_one(&ctx, NewNote::new("t", "b")).await.unwrap();
    token.cancel();

    let err = store.count(&ctx, NoteFilter::all()).await.unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test]
#[ignore = "requires a MongoDB server at NOTEKEEP_TEST_URI"]
async fn test_properties_live() {
    let Ok(uri) = std::env::var("NOTEKEEP_TEST_URI") else {
        eprintln!("NOTEKEEP_TEST_URI not set, skipping");
        return;
    };

    let collection = format!("notes_test_{}", NoteId::new());
    let config = StoreConfig::builder()
        .uri(uri)
        .database("glottery")
        .collection(collection.as_str())
        .connect_timeout(Duration::from_secs(5))
        .build()
        .unwrap();

    let store = NoteStore::connect(&ctx(), config).await.unwrap();
    assert_eq!(store.backend_name(), "mongodb");
    run_properties(&store).await;
    store.close().await;
}

#[tokio::test]
async fn test_connect_unreachable_server() {
    let config = StoreConfig::builder()
        .uri("mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=200")
        .database("glottery")
        .collection("notes")
        .connect_timeout(Duration::from_millis(200))
        .server_selection_timeout(Duration::from_millis(200))
        .build()
        .unwrap();

    let ctx = OpContext::background().with_timeout(Duration::from_secs(5));
    let err = NoteStore::connect(&ctx, config).await.unwrap_err();
    assert!(err.is_connection_error(), "unexpected error: {err}");
}
