//! File store download, timestamp and read tests.

mod common;

use std::fs;
use std::io::Write;
use std::time::Duration;

use flate2::write::GzEncoder;
use flate2::Compression;
use mtg_inventory::{FileStore, InventoryError};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn store(tmp: &TempDir, offline: bool) -> FileStore {
    FileStore::new(Some(tmp.path().join("store")), offline, Duration::from_secs(5)).unwrap()
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

#[test]
fn new_creates_directory() {
    let tmp = TempDir::new().unwrap();
    let store = store(&tmp, true);
    assert!(store.dir.is_dir());
}

#[test]
fn path_rejects_nested_and_reserved_names() {
    let tmp = TempDir::new().unwrap();
    let store = store(&tmp, true);

    assert!(store.path("AllPrintings.json.gz").is_ok());
    for bad in ["../escape.json", "nested/file.json", "timestamps.json", ""] {
        let err = store.path(bad).unwrap_err();
        assert!(matches!(err, InventoryError::InvalidArgument(_)), "{}", bad);
    }
}

// ---------------------------------------------------------------------------
// Downloads
// ---------------------------------------------------------------------------

#[tokio::test]
async fn download_writes_file_and_records_timestamp() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/SetList.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{ "code": "M10" }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let tmp = TempDir::new().unwrap();
    let mut store = store(&tmp, false);
    let url = format!("{}/SetList.json", mock_server.uri());

    let (store, first, second) = tokio::task::spawn_blocking(move || {
        let first = store.ensure_file(&url, "SetList.json").unwrap();
        // Already present: no second request.
        let second = store.ensure_file(&url, "SetList.json").unwrap();
        store.close();
        (store, first, second)
    })
    .await
    .unwrap();

    assert_eq!(first, second);
    let status = store.check_file("SetList.json").unwrap();
    assert!(status.exists);
    assert!(status.last_modified.is_some());
    assert_eq!(store.load_json("SetList.json").unwrap()["data"][0]["code"], "M10");
}

#[tokio::test]
async fn failed_download_leaves_nothing_behind() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let tmp = TempDir::new().unwrap();
    let mut store = store(&tmp, false);
    let url = format!("{}/missing.json", mock_server.uri());

    let (store, result) = tokio::task::spawn_blocking(move || {
        let result = store.download_file(&url, "missing.json");
        store.close();
        (store, result)
    })
    .await
    .unwrap();

    assert!(matches!(result, Err(InventoryError::Http(_))));
    assert!(!store.check_file("missing.json").unwrap().exists);
    let leftovers = fs::read_dir(&store.dir).unwrap().count();
    assert_eq!(leftovers, 0);
}

#[tokio::test]
async fn refresh_meta_reads_version_from_cdn() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v5/Meta.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": { "date": "2026-10-01", "version": "5.2.2+20261001" }
        })))
        .mount(&mock_server)
        .await;

    let tmp = TempDir::new().unwrap();
    let mut store = store(&tmp, false);
    store.cdn_base = format!("{}/api/v5/", mock_server.uri());

    let version = tokio::task::spawn_blocking(move || {
        let version = store.refresh_meta().unwrap();
        store.close();
        version
    })
    .await
    .unwrap();
    assert_eq!(version.as_deref(), Some("5.2.2+20261001"));
}

#[test]
fn offline_store_never_downloads() {
    let tmp = TempDir::new().unwrap();
    let mut store = store(&tmp, true);

    let err = store
        .download_file("http://127.0.0.1:9/x.json", "x.json")
        .unwrap_err();
    assert!(matches!(err, InventoryError::NotFound(_)));

    let err = store
        .ensure_file("http://127.0.0.1:9/x.json", "x.json")
        .unwrap_err();
    assert!(matches!(err, InventoryError::NotFound(_)));

    assert!(store.refresh_all_printings().is_err());
}

#[test]
fn ensure_file_returns_existing_file_offline() {
    let tmp = TempDir::new().unwrap();
    let mut store = store(&tmp, true);
    fs::write(store.dir.join("Meta.json"), "{}").unwrap();

    let path = store.ensure_file("http://127.0.0.1:9/Meta.json", "Meta.json").unwrap();
    assert_eq!(path, store.dir.join("Meta.json"));
    // Not downloaded by the store, so no timestamp.
    assert!(store.check_file("Meta.json").unwrap().last_modified.is_none());
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

#[test]
fn load_json_decompresses_gz() {
    let tmp = TempDir::new().unwrap();
    let store = store(&tmp, true);

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(br#"{"meta": {"version": "5.2.2"}}"#).unwrap();
    fs::write(store.dir.join("Meta.json.gz"), encoder.finish().unwrap()).unwrap();

    let value = store.load_json("Meta.json.gz").unwrap();
    assert_eq!(value["meta"]["version"], "5.2.2");
}

#[test]
fn load_json_missing_file_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let store = store(&tmp, true);
    assert!(matches!(
        store.load_json("nope.json"),
        Err(InventoryError::NotFound(_))
    ));
}

#[test]
fn corrupt_file_is_removed() {
    common::init_logging();
    let tmp = TempDir::new().unwrap();
    let store = store(&tmp, true);
    fs::write(store.dir.join("broken.json.gz"), b"not gzip at all").unwrap();

    let err = store.load_json("broken.json.gz").unwrap_err();
    assert!(matches!(err, InventoryError::NotFound(_)));
    assert!(!store.dir.join("broken.json.gz").exists());
}

// ---------------------------------------------------------------------------
// Removal
// ---------------------------------------------------------------------------

#[test]
fn remove_and_clear() {
    let tmp = TempDir::new().unwrap();
    let store = store(&tmp, true);
    fs::write(store.dir.join("a.json"), "[]").unwrap();
    fs::write(store.dir.join("b.json"), "[]").unwrap();

    assert!(store.remove("a.json").unwrap());
    assert!(!store.remove("a.json").unwrap());

    store.clear().unwrap();
    assert!(store.dir.is_dir());
    assert_eq!(fs::read_dir(&store.dir).unwrap().count(), 0);
}
