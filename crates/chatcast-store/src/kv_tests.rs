use super::*;
use serde_json::json;
use tempfile::TempDir;

#[tokio::test]
async fn test_memory_store_roundtrip_and_remove() {
    let store = MemoryStore::new();
    assert_eq!(store.get("k").await.unwrap(), None);

    store.set("k", json!({"a": 1})).await.unwrap();
    assert_eq!(store.get("k").await.unwrap(), Some(json!({"a": 1})));

    store.remove("k").await.unwrap();
    assert_eq!(store.get("k").await.unwrap(), None);
}

#[tokio::test]
async fn test_memory_store_publishes_changes() {
    let store = MemoryStore::new();
    let mut rx = store.subscribe();

    store.set("k", json!(1)).await.unwrap();
    store.remove("k").await.unwrap();
    // Removing an absent key is silent.
    store.remove("k").await.unwrap();

    assert_eq!(
        rx.recv().await.unwrap(),
        StoreChange { key: "k".into(), new_value: Some(json!(1)) }
    );
    assert_eq!(
        rx.recv().await.unwrap(),
        StoreChange { key: "k".into(), new_value: None }
    );
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_file_store_persists_across_instances() {
    let temp_dir = TempDir::new().unwrap();
    {
        let store = JsonFileStore::new(temp_dir.path()).await.unwrap();
        store.set("chatcast-history", json!([{"id": "1"}])).await.unwrap();
    }

    let store = JsonFileStore::new(temp_dir.path()).await.unwrap();
    assert_eq!(
        store.get("chatcast-history").await.unwrap(),
        Some(json!([{"id": "1"}]))
    );
    assert!(temp_dir.path().join("chatcast-history.json").exists());
    assert!(!temp_dir.path().join("chatcast-history.json.tmp").exists());
}

#[tokio::test]
async fn test_file_store_sanitizes_keys() {
    let temp_dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(temp_dir.path()).await.unwrap();
    store.set("../escape", json!(true)).await.unwrap();
    assert!(temp_dir.path().join("___escape.json").exists());
    assert_eq!(store.get("../escape").await.unwrap(), Some(json!(true)));
}

#[tokio::test]
async fn test_file_store_remove_missing_is_ok() {
    let temp_dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(temp_dir.path()).await.unwrap();
    store.remove("nothing").await.unwrap();
    assert_eq!(store.get("nothing").await.unwrap(), None);
}

#[tokio::test]
async fn test_file_store_ignores_corrupt_file() {
    let temp_dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(temp_dir.path()).await.unwrap();
    std::fs::write(temp_dir.path().join("broken.json"), "{not json").unwrap();
    assert_eq!(store.get("broken").await.unwrap(), None);
}

#[tokio::test]
async fn test_typed_helpers() {
    let store = MemoryStore::new();
    save(&store, "nums", &vec![1, 2, 3]).await.unwrap();
    let nums: Option<Vec<i32>> = load(&store, "nums").await.unwrap();
    assert_eq!(nums, Some(vec![1, 2, 3]));

    let missing: Option<Vec<i32>> = load(&store, "missing").await.unwrap();
    assert!(missing.is_none());

    store.set("bad", json!("text")).await.unwrap();
    assert!(load::<Vec<i32>>(&store, "bad").await.is_err());
}
