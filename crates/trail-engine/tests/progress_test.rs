use tempfile::TempDir;
use trail_engine::progress::{FileProgressStore, MemoryProgressStore, ProgressStore};

async fn exercise(store: &dyn ProgressStore) {
    assert!(!store.is_completed("intro").await.unwrap());
    assert_eq!(store.last_step("intro").await.unwrap(), None);

    store.save_step("intro", 2).await.unwrap();
    store.save_step("other", 1).await.unwrap();
    assert_eq!(store.last_step("intro").await.unwrap(), Some(2));

    store.mark_completed("intro").await.unwrap();
    assert!(store.is_completed("intro").await.unwrap());
    assert_eq!(store.last_step("intro").await.unwrap(), Some(2));

    store.reset("intro").await.unwrap();
    assert!(!store.is_completed("intro").await.unwrap());
    assert_eq!(store.last_step("intro").await.unwrap(), None);
    assert_eq!(store.last_step("other").await.unwrap(), Some(1));
}

#[tokio::test]
async fn test_memory_store() {
    exercise(&MemoryProgressStore::new()).await;
}

#[tokio::test]
async fn test_file_store() {
    let dir = TempDir::new().unwrap();
    let store = FileProgressStore::new(dir.path().join("nested").join("progress.json"));
    exercise(&store).await;
}

#[tokio::test]
async fn test_file_store_persists_across_instances() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("progress.json");

    FileProgressStore::new(&path)
        .save_step("intro", 3)
        .await
        .unwrap();

    let reopened = FileProgressStore::new(&path);
    assert_eq!(reopened.last_step("intro").await.unwrap(), Some(3));
}

#[tokio::test]
async fn test_corrupt_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("progress.json");
    tokio::fs::write(&path, "not json").await.unwrap();

    let store = FileProgressStore::new(&path);
    assert!(store.is_completed("intro").await.is_err());
}
