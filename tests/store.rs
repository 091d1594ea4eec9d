//! Integration tests for the file-backed stores.
//!
//! Each test works in its own temporary directory.

use chrono::NaiveDate;
use hoos_open::{
    Building, CommentPolicy, DocumentStore, Favorites, FileDocumentStore, FileKeyValueStore,
    KeyValueStore, MockClock, WeeklyHours, import_buildings, list_comments, load_building,
    load_buildings, post_comment,
};
use serde_json::json;

fn clock() -> MockClock {
    MockClock::new(
        NaiveDate::from_ymd_opt(2024, 9, 3)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap(),
    )
}

#[test]
fn test_documents_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();

    {
        let store = FileDocumentStore::new(dir.path());
        store
            .set("locations", "1", json!({"name": "Alderman Library"}))
            .unwrap();
    }

    let store = FileDocumentStore::new(dir.path());
    let doc = store.get("locations", "1").unwrap().expect("Document should persist");
    assert_eq!(doc.data["name"], "Alderman Library");
    assert!(dir.path().join("locations.json").exists());
}

#[test]
fn test_set_replaces_existing_document() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileDocumentStore::new(dir.path());

    store.set("c", "a", json!({"v": 1})).unwrap();
    store.set("c", "a", json!({"v": 2})).unwrap();

    let docs = store.list("c").unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].data["v"], 2);
}

#[test]
fn test_nested_collections_are_separate_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileDocumentStore::new(dir.path());

    store.set("locations", "1", json!({"name": "Rice Hall"})).unwrap();
    store.add("locations/1/comments", json!({"text": "hi"})).unwrap();

    assert!(dir.path().join("locations/1/comments.json").exists());
    assert_eq!(store.list("locations").unwrap().len(), 1);
    assert_eq!(store.list("locations/1/comments").unwrap().len(), 1);
}

#[test]
fn test_invalid_collection_path_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileDocumentStore::new(dir.path());
    assert!(store.set("../outside", "x", json!({})).is_err());
    assert!(store.list("").is_err());
}

#[test]
fn test_import_and_comment_flow_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileDocumentStore::new(dir.path());

    let buildings = vec![Building {
        id: "1".to_string(),
        name: "Alderman Library".to_string(),
        hours: WeeklyHours::new().with("M-F", "8am - 10pm"),
        ..Default::default()
    }];
    import_buildings(&store, &buildings).unwrap();

    let loaded = load_buildings(&store).unwrap();
    assert_eq!(loaded, buildings);
    assert_eq!(load_building(&store, "1").unwrap().unwrap().name, "Alderman Library");

    post_comment(&store, &clock(), &CommentPolicy::default(), "1", None, "Open late!").unwrap();
    let comments = list_comments(&store, "1").unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].text, "Open late!");
}

#[test]
fn test_key_value_round_trip_and_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("device.json");

    {
        let store = FileKeyValueStore::new(&path);
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        store.set("a", "3").unwrap();
    }

    let store = FileKeyValueStore::new(&path);
    assert_eq!(store.get("a").unwrap().as_deref(), Some("3"));
    assert_eq!(store.get("b").unwrap().as_deref(), Some("2"));
    assert_eq!(store.get("c").unwrap(), None);
}

#[test]
fn test_favorites_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let device = FileKeyValueStore::new(dir.path().join("device.json"));
    let key = "UVA_FAVORITE_BUILDINGS";

    let mut favorites = Favorites::load(&device, key).unwrap();
    favorites.toggle(&device, key, "Clemons Library").unwrap();
    favorites.toggle(&device, key, "Rice Hall").unwrap();

    let reopened = FileKeyValueStore::new(dir.path().join("device.json"));
    let favorites = Favorites::load(&reopened, key).unwrap();
    assert_eq!(favorites.len(), 2);
    assert!(favorites.contains("Rice Hall"));
}

#[test]
fn test_corrupt_key_value_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("device.json");
    std::fs::write(&path, "[1, 2, 3]").unwrap();

    let store = FileKeyValueStore::new(&path);
    assert!(store.get("a").is_err());
}
