//! End-to-end checks of the history file through the public API

use std::fs;

use tempfile::TempDir;
use vincli::cache::{History, HistoryEntry, HistoryError, HistoryStore};
use vincli::data::{VehicleRecord, Vin};

const FORD: &str = "1M8GDM9AXKP042788";
const GOLF: &str = "WVWZZZ1JZXW000001";

fn store(temp_dir: &TempDir) -> HistoryStore {
    HistoryStore::new(temp_dir.path().join("autolookup_history.json"))
}

fn record(vin: &str, model: &str) -> VehicleRecord {
    [("vin", vin), ("make", "Ford"), ("model", model)]
        .into_iter()
        .collect()
}

fn vin(s: &str) -> Vin {
    Vin::parse(s).unwrap()
}

#[test]
fn test_appends_keep_insertion_order() {
    let temp_dir = TempDir::new().unwrap();
    let store = store(&temp_dir);

    store.append(record(FORD, "F-150")).unwrap();
    store.append(record(GOLF, "Golf")).unwrap();

    let history = store.load();
    let vins: Vec<Option<&str>> = history.iter().map(|e| e.vin.as_deref()).collect();
    assert_eq!(vins, vec![Some(FORD), Some(GOLF)]);
}

#[test]
fn test_cache_returns_most_recent_record() {
    let temp_dir = TempDir::new().unwrap();
    let store = store(&temp_dir);

    store.append(record(FORD, "first")).unwrap();
    store.append(record(GOLF, "Golf")).unwrap();
    store.append(record(FORD, "second")).unwrap();

    let cached = store.find_cached(&vin(FORD)).unwrap();
    assert_eq!(cached.get("model").and_then(|v| v.as_text()), Some("second"));
    assert!(store.find_cached(&vin("2HGFG12688H500001")).is_none());
}

#[test]
fn test_delete_first_of_three() {
    let temp_dir = TempDir::new().unwrap();
    let store = store(&temp_dir);
    for model in ["a", "b", "c"] {
        store.append(record(FORD, model)).unwrap();
    }

    let removed = store.delete_at(1).unwrap();
    assert_eq!(removed.data.get("model").and_then(|v| v.as_text()), Some("a"));

    let models: Vec<String> = store
        .load()
        .iter()
        .map(|e| e.data.get("model").map(|v| v.to_string()).unwrap_or_default())
        .collect();
    assert_eq!(models, vec!["b", "c"]);
}

#[test]
fn test_delete_out_of_range_changes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let store = store(&temp_dir);
    store.append(record(FORD, "a")).unwrap();
    let before = fs::read_to_string(store.path()).unwrap();

    let err = store.delete_at(0).unwrap_err();
    assert!(matches!(err, HistoryError::IndexOutOfRange { index: 0, len: 1 }));
    assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
}

#[test]
fn test_missing_and_corrupted_files_load_empty() {
    let temp_dir = TempDir::new().unwrap();
    let store = store(&temp_dir);
    assert!(store.load().is_empty());

    fs::write(store.path(), "{not valid json").unwrap();
    assert!(store.load().is_empty());

    fs::write(store.path(), "").unwrap();
    assert!(store.load().is_empty());
}

#[test]
fn test_clear_then_append_starts_over() {
    let temp_dir = TempDir::new().unwrap();
    let store = store(&temp_dir);
    store.append(record(FORD, "a")).unwrap();
    store.clear().unwrap();
    assert!(store.load().is_empty());

    store.append(record(GOLF, "Golf")).unwrap();
    assert_eq!(store.load().len(), 1);
}

#[test]
fn test_persist_load_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let store = store(&temp_dir);

    let mut data = record(FORD, "F-150");
    data.insert("year", 2019_i64);
    data.insert("electric", false);
    data.insert("trim", serde_json::Value::Null);
    let history = History::from(vec![
        HistoryEntry {
            timestamp: "2025-06-01T14:30:00.000000+02:00".to_string(),
            vin: Some(FORD.to_string()),
            data,
        },
        HistoryEntry {
            timestamp: "2025-06-02T08:00:00".to_string(),
            vin: None,
            data: VehicleRecord::new(),
        },
    ]);

    store.persist(&history).unwrap();
    assert_eq!(store.load(), history);
}

#[test]
fn test_reads_files_written_by_older_versions() {
    let temp_dir = TempDir::new().unwrap();
    let store = store(&temp_dir);
    fs::write(
        store.path(),
        r#"[
            {"timestamp": "2024-03-01T10:00:00.123456", "vin": "1M8GDM9AXKP042788", "data": {"brand": "Ford", "year": 2019}},
            {"timestamp": "2024-03-02T10:00:00"},
            42
        ]"#,
    )
    .unwrap();

    let history = store.load();
    assert_eq!(history.len(), 2);
    assert_eq!(history.entries()[0].display_timestamp(), "2024-03-01 10:00:00");
    assert!(history.entries()[1].vin.is_none());
    assert!(history.entries()[1].data.is_empty());
    assert!(store.find_cached(&vin(FORD)).is_some());
}
