use super::*;
use crate::grid::LightColor;
use crate::preset::{PresetCategory, PresetLight};
use crate::remote::PresetDraft;

fn draft(name: &str) -> PresetDraft {
    PresetDraft {
        name: name.into(),
        description: "test".into(),
        category: PresetCategory::Custom,
        lights: vec![PresetLight { id: 12, color: LightColor::Red }],
    }
}

#[tokio::test]
async fn load_snapshot_missing_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let docs = load_snapshot(&dir.path().join("absent.json")).await.unwrap();
    assert!(docs.is_empty());
}

#[tokio::test]
async fn load_snapshot_malformed_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    tokio::fs::write(&path, "{oops").await.unwrap();
    let err = load_snapshot(&path).await.unwrap_err();
    assert!(matches!(err, SnapshotError::Malformed { .. }));
}

#[tokio::test]
async fn write_then_load_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("presets.json");
    let docs = vec![PresetDocument::from_draft("a".into(), draft("a"), 10)];

    write_snapshot(&path, &docs).await.unwrap();
    assert_eq!(load_snapshot(&path).await.unwrap(), docs);
}

#[tokio::test]
async fn flush_if_dirty_writes_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("presets.json");
    let documents = MemoryRemote::new();

    assert!(!flush_if_dirty(&documents, &path).await.unwrap());
    assert!(!path.exists());

    documents.add(draft("first")).await;
    assert!(flush_if_dirty(&documents, &path).await.unwrap());
    assert!(!flush_if_dirty(&documents, &path).await.unwrap());

    let restored = MemoryRemote::from_documents(load_snapshot(&path).await.unwrap());
    assert_eq!(restored.len().await, 1);
}

#[tokio::test]
async fn flush_failure_keeps_collection_dirty() {
    let dir = tempfile::tempdir().unwrap();
    // A directory where the snapshot file should go makes the rename fail.
    let path = dir.path().join("taken");
    tokio::fs::create_dir_all(path.join("child")).await.unwrap();

    let documents = MemoryRemote::new();
    documents.add(draft("first")).await;
    assert!(flush_if_dirty(&documents, &path).await.is_err());
    assert!(documents.take_dirty_snapshot().await.is_some());
}

#[tokio::test]
async fn spawned_task_flushes_new_documents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("presets.json");
    let documents = MemoryRemote::new();
    let handle = spawn_persistence_task(documents.clone(), path.clone(), 10);

    documents.add(draft("background")).await;
    let mut written = Vec::new();
    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        if let Ok(docs) = load_snapshot(&path).await {
            if !docs.is_empty() {
                written = docs;
                break;
            }
        }
    }
    handle.abort();
    assert_eq!(written.len(), 1);
    assert_eq!(written[0].name, "background");
}
