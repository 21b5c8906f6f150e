//! Tests for the embedded document collection
//!
//! These tests verify:
//! - Identifier and version assignment on insert
//! - Unique index enforcement on insert and update
//! - Find with filters, sort, skip, limit and field exclusion
//! - Persistence across reopen and compaction

use std::sync::Arc;

use pokedex::store::{
    Collection, CollectionOptions, Document, DocumentCollection, Filter, FindOptions, ObjectId,
    SortOrder, StoreError, WriteFailure,
};
use serde_json::{json, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn options() -> CollectionOptions {
    CollectionOptions::new("pokemons").unique("name").unique("no")
}

fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {}", other),
    }
}

fn mon(no: u64, name: &str) -> Document {
    doc(json!({ "no": no, "name": name }))
}

fn id_of(doc: &Document) -> ObjectId {
    doc["_id"].as_str().unwrap().parse().unwrap()
}

// =============================================================================
// Insert Tests
// =============================================================================

#[tokio::test]
async fn test_insert_assigns_id_and_version() {
    let collection = DocumentCollection::in_memory(options());

    let stored = collection.insert_one(mon(25, "pikachu")).await.unwrap();

    assert!(ObjectId::is_valid(stored["_id"].as_str().unwrap()));
    assert_eq!(stored["__v"], json!(0));
    assert_eq!(stored["name"], json!("pikachu"));
    assert_eq!(collection.len(), 1);
}

#[tokio::test]
async fn test_insert_duplicate_name_is_rejected() {
    let collection = DocumentCollection::in_memory(options());
    collection.insert_one(mon(25, "pikachu")).await.unwrap();

    let err = collection.insert_one(mon(26, "pikachu")).await.unwrap_err();

    match &err {
        StoreError::DuplicateKey { index, key_value, .. } => {
            assert_eq!(index, "name_1");
            assert_eq!(key_value, &json!({ "name": "pikachu" }));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.to_string().contains("E11000"));
    assert_eq!(collection.len(), 1);
}

#[tokio::test]
async fn test_insert_duplicate_no_is_rejected() {
    let collection = DocumentCollection::in_memory(options());
    collection.insert_one(mon(25, "pikachu")).await.unwrap();

    let err = collection.insert_one(mon(25, "raichu")).await.unwrap_err();

    match collection.classify(&err) {
        WriteFailure::Duplicate { index, key_value } => {
            assert_eq!(index, "no_1");
            assert_eq!(key_value, json!({ "no": 25 }));
        }
        WriteFailure::Other => panic!("expected a duplicate"),
    }
}

#[tokio::test]
async fn test_numeric_index_treats_int_and_float_alike() {
    let collection = DocumentCollection::in_memory(options());
    collection.insert_one(mon(25, "pikachu")).await.unwrap();

    let err = collection
        .insert_one(doc(json!({ "no": 25.0, "name": "raichu" })))
        .await;

    assert!(matches!(err, Err(StoreError::DuplicateKey { .. })));
}

#[tokio::test]
async fn test_unique_index_is_sparse() {
    let collection = DocumentCollection::in_memory(options());

    collection.insert_one(doc(json!({ "name": "a" }))).await.unwrap();
    collection.insert_one(doc(json!({ "name": "b" }))).await.unwrap();

    assert_eq!(collection.len(), 2);
}

#[tokio::test]
async fn test_insert_explicit_duplicate_id() {
    let collection = DocumentCollection::in_memory(options());
    let stored = collection.insert_one(mon(1, "bulbasaur")).await.unwrap();

    let mut again = mon(2, "ivysaur");
    again.insert("_id".to_string(), stored["_id"].clone());
    let err = collection.insert_one(again).await.unwrap_err();

    match collection.classify(&err) {
        WriteFailure::Duplicate { index, .. } => assert_eq!(index, "_id_"),
        WriteFailure::Other => panic!("expected a duplicate"),
    }
}

#[tokio::test]
async fn test_insert_many_stops_at_first_error() {
    let collection = DocumentCollection::in_memory(options());

    let result = collection
        .insert_many(vec![mon(1, "a"), mon(2, "b"), mon(1, "c"), mon(4, "d")])
        .await;

    assert!(result.is_err());
    assert_eq!(collection.len(), 2);
}

// =============================================================================
// Update Tests
// =============================================================================

#[tokio::test]
async fn test_update_merges_fields() {
    let collection = DocumentCollection::in_memory(options());
    let stored = collection.insert_one(mon(25, "pikachu")).await.unwrap();
    let id = id_of(&stored);

    let updated = collection
        .update_by_id(&id, doc(json!({ "name": "raichu", "type": "electric" })))
        .await
        .unwrap();

    assert_eq!(updated, 1);
    let current = collection.find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(current["name"], json!("raichu"));
    assert_eq!(current["no"], json!(25));
    assert_eq!(current["type"], json!("electric"));

    // Old name is free again
    collection.insert_one(mon(26, "pikachu")).await.unwrap();
}

#[tokio::test]
async fn test_update_to_own_value_is_not_a_conflict() {
    let collection = DocumentCollection::in_memory(options());
    let stored = collection.insert_one(mon(25, "pikachu")).await.unwrap();

    let updated = collection
        .update_by_id(&id_of(&stored), mon(25, "pikachu"))
        .await
        .unwrap();

    assert_eq!(updated, 1);
}

#[tokio::test]
async fn test_update_conflict_leaves_document_unchanged() {
    let collection = DocumentCollection::in_memory(options());
    collection.insert_one(mon(1, "bulbasaur")).await.unwrap();
    let stored = collection.insert_one(mon(4, "charmander")).await.unwrap();
    let id = id_of(&stored);

    let err = collection
        .update_by_id(&id, doc(json!({ "no": 1 })))
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::DuplicateKey { .. }));
    let current = collection.find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(current["no"], json!(4));
}

#[tokio::test]
async fn test_update_missing_returns_zero() {
    let collection = DocumentCollection::in_memory(options());

    let updated = collection
        .update_by_id(&ObjectId::new(), doc(json!({ "name": "x" })))
        .await
        .unwrap();

    assert_eq!(updated, 0);
}

#[tokio::test]
async fn test_update_cannot_change_id() {
    let collection = DocumentCollection::in_memory(options());
    let stored = collection.insert_one(mon(25, "pikachu")).await.unwrap();
    let id = id_of(&stored);

    collection
        .update_by_id(&id, doc(json!({ "_id": ObjectId::new().to_hex() })))
        .await
        .unwrap();

    assert!(collection.find_by_id(&id).await.unwrap().is_some());
}

// =============================================================================
// Delete Tests
// =============================================================================

#[tokio::test]
async fn test_delete_one_by_id() {
    let collection = DocumentCollection::in_memory(options());
    let stored = collection.insert_one(mon(25, "pikachu")).await.unwrap();
    let id = id_of(&stored);

    assert_eq!(collection.delete_one(&Filter::Id(id)).await.unwrap(), 1);
    assert_eq!(collection.delete_one(&Filter::Id(id)).await.unwrap(), 0);
    assert!(collection.is_empty());
}

#[tokio::test]
async fn test_delete_many_all() {
    let collection = DocumentCollection::in_memory(options());
    collection
        .insert_many(vec![mon(1, "a"), mon(2, "b"), mon(3, "c")])
        .await
        .unwrap();

    assert_eq!(collection.delete_many(&Filter::All).await.unwrap(), 3);
    assert!(collection.is_empty());

    // Indexes were cleared as well
    collection.insert_one(mon(1, "a")).await.unwrap();
}

// =============================================================================
// Find Tests
// =============================================================================

#[tokio::test]
async fn test_find_sort_skip_limit_exclude() {
    let collection = DocumentCollection::in_memory(options());
    for no in [5u64, 3, 1, 4, 2] {
        collection.insert_one(mon(no, &format!("mon{}", no))).await.unwrap();
    }

    let options = FindOptions::new()
        .sort("no", SortOrder::Ascending)
        .skip(1)
        .limit(2)
        .exclude("__v");
    let docs = collection.find(&Filter::All, &options).await.unwrap();

    let numbers: Vec<u64> = docs.iter().map(|d| d["no"].as_u64().unwrap()).collect();
    assert_eq!(numbers, vec![2, 3]);
    assert!(docs.iter().all(|d| !d.contains_key("__v")));
}

#[tokio::test]
async fn test_find_descending() {
    let collection = DocumentCollection::in_memory(options());
    for no in 1..=3u64 {
        collection.insert_one(mon(no, &format!("mon{}", no))).await.unwrap();
    }

    let docs = collection
        .find(&Filter::All, &FindOptions::new().sort("no", SortOrder::Descending))
        .await
        .unwrap();

    let numbers: Vec<u64> = docs.iter().map(|d| d["no"].as_u64().unwrap()).collect();
    assert_eq!(numbers, vec![3, 2, 1]);
}

#[tokio::test]
async fn test_find_one_by_field_and_count() {
    let collection = DocumentCollection::in_memory(options());
    collection.insert_one(mon(25, "pikachu")).await.unwrap();
    collection.insert_one(mon(26, "raichu")).await.unwrap();

    let found = collection
        .find_one(&Filter::eq("name", "raichu"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found["no"], json!(26));

    assert!(collection
        .find_one(&Filter::eq("no", 99))
        .await
        .unwrap()
        .is_none());
    assert_eq!(collection.count(&Filter::All).await.unwrap(), 2);
    assert_eq!(collection.count(&Filter::eq("no", 25)).await.unwrap(), 1);
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[tokio::test]
async fn test_reopen_restores_documents_and_indexes() {
    let temp = TempDir::new().unwrap();
    let id;

    {
        let collection = DocumentCollection::open(temp.path(), options()).unwrap();
        let stored = collection.insert_one(mon(25, "pikachu")).await.unwrap();
        id = id_of(&stored);
        collection.insert_one(mon(1, "bulbasaur")).await.unwrap();
        collection
            .update_by_id(&id, doc(json!({ "name": "raichu" })))
            .await
            .unwrap();
        collection
            .delete_one(&Filter::eq("name", "bulbasaur"))
            .await
            .unwrap();
    }

    let collection = DocumentCollection::open(temp.path(), options()).unwrap();

    assert_eq!(collection.len(), 1);
    let current = collection.find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(current["name"], json!("raichu"));

    let err = collection.insert_one(mon(25, "other")).await;
    assert!(matches!(err, Err(StoreError::DuplicateKey { .. })));
    collection.insert_one(mon(1, "bulbasaur")).await.unwrap();
}

#[tokio::test]
async fn test_reopen_after_clear() {
    let temp = TempDir::new().unwrap();

    {
        let collection = DocumentCollection::open(temp.path(), options()).unwrap();
        collection.insert_one(mon(1, "a")).await.unwrap();
        collection.delete_many(&Filter::All).await.unwrap();
        collection.insert_one(mon(2, "b")).await.unwrap();
    }

    let collection = DocumentCollection::open(temp.path(), options()).unwrap();
    assert_eq!(collection.len(), 1);
    assert!(collection
        .find_one(&Filter::eq("name", "b"))
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_compact_shrinks_wal() {
    let temp = TempDir::new().unwrap();
    let collection = Arc::new(DocumentCollection::open(temp.path(), options()).unwrap());

    for no in 1..=20u64 {
        collection.insert_one(mon(no, &format!("mon{}", no))).await.unwrap();
    }
    collection
        .delete_many(&Filter::eq("name", "mon1"))
        .await
        .unwrap();
    for no in 2..=20u64 {
        collection
            .delete_one(&Filter::eq("no", no))
            .await
            .unwrap();
    }
    collection.insert_one(mon(99, "last")).await.unwrap();

    let wal_path = collection.wal_path().unwrap().to_path_buf();
    let before = std::fs::metadata(&wal_path).unwrap().len();
    collection.compact().unwrap();
    let after = std::fs::metadata(&wal_path).unwrap().len();
    assert!(after < before);

    drop(collection);
    let reopened = DocumentCollection::open(temp.path(), options()).unwrap();
    assert_eq!(reopened.len(), 1);
}

#[tokio::test]
async fn test_failed_compact_keeps_logging_writes() {
    let temp = TempDir::new().unwrap();
    let collection = DocumentCollection::open(temp.path(), options()).unwrap();
    collection.insert_one(mon(1, "bulbasaur")).await.unwrap();

    let tmp_path = temp.path().join("pokemons.wal.tmp");
    std::fs::create_dir(&tmp_path).unwrap();
    assert!(collection.compact().is_err());

    collection.insert_one(mon(4, "charmander")).await.unwrap();
    drop(collection);
    std::fs::remove_dir(&tmp_path).unwrap();

    let reopened = DocumentCollection::open(temp.path(), options()).unwrap();
    assert_eq!(reopened.len(), 2);
    assert!(reopened
        .find_one(&Filter::eq("name", "charmander"))
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_wal_file_named_after_collection() {
    let temp = TempDir::new().unwrap();
    let collection = DocumentCollection::open(temp.path(), options()).unwrap();

    assert_eq!(
        collection.wal_path().unwrap(),
        temp.path().join("pokemons.wal").as_path()
    );
    assert!(DocumentCollection::in_memory(options()).wal_path().is_none());
}
