use tempfile::TempDir;

use ragdb_core::traits::ChunkStorage;
use ragdb_core::types::{ChildChunk, ParentChunk};
use ragdb_store::SqliteChunkStore;

fn parent(id: &str, text: &str) -> ParentChunk {
    ParentChunk {
        parent_id: id.to_string(),
        doc_id: "doc".to_string(),
        text: text.to_string(),
        start: 0,
        end: text.len(),
    }
}

fn child(id: &str, parent_id: &str, text: &str) -> ChildChunk {
    ChildChunk {
        child_id: id.to_string(),
        parent_id: parent_id.to_string(),
        text: text.to_string(),
    }
}

#[test]
fn put_get_roundtrip() {
    let store = SqliteChunkStore::open_in_memory().expect("open");
    store.put_parents(&[parent("doc:0", "full parent passage")]).expect("put parents");
    store.put_children(&[child("doc:0:0", "doc:0", "child passage")]).expect("put children");

    let p = store.get_parent("doc:0").expect("get").expect("present");
    assert_eq!(p.text, "full parent passage");
    assert_eq!(p.end, p.text.len());

    let c = store.get_child("doc:0:0").expect("get").expect("present");
    assert_eq!(c.parent_id, "doc:0");
}

#[test]
fn missing_ids_are_none_not_errors() {
    let store = SqliteChunkStore::open_in_memory().expect("open");
    assert!(store.get_parent("nope").expect("get").is_none());
    assert!(store.get_child("nope").expect("get").is_none());
}

#[test]
fn reinsert_replaces_existing_rows() {
    let store = SqliteChunkStore::open_in_memory().expect("open");
    store.put_parents(&[parent("doc:0", "v1")]).expect("put");
    store.put_parents(&[parent("doc:0", "v2")]).expect("put again");
    let p = store.get_parent("doc:0").expect("get").expect("present");
    assert_eq!(p.text, "v2");
}

#[test]
fn store_survives_reopen() {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("chunks.sqlite");
    {
        let store = SqliteChunkStore::open(&db_path).expect("open");
        store.put_parents(&[parent("doc:0", "durable text")]).expect("put");
    }
    let store = SqliteChunkStore::open(&db_path).expect("reopen");
    let p = store.get_parent("doc:0").expect("get").expect("present");
    assert_eq!(p.text, "durable text");
}
