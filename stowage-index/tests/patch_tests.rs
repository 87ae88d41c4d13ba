use std::sync::Arc;
use stowage_index::{IndexEntry, Namespace, Patch, PatchAction, PatchWriter};
use stowage_store::{MemoryStore, ObjectStore};

fn put_patch(id: &str, splay: u8) -> Patch {
    Patch {
        action: PatchAction::Put,
        data: IndexEntry {
            prefix: "corpus".to_string(),
            item_type: "item".to_string(),
            id: id.to_string(),
            splay,
        },
    }
}

#[tokio::test]
async fn patch_lands_under_the_namespace_patch_prefix() {
    let store = Arc::new(MemoryStore::new());
    let writer = PatchWriter::new(store.clone());
    let ns = Namespace::new("corpus", "item").unwrap();

    let key = writer.write(&ns, &put_patch("x", 1)).await.unwrap();
    assert!(key.starts_with(&ns.patch_prefix()));
    assert!(store.exists(&key).await.unwrap());
}

#[tokio::test]
async fn identical_patches_share_one_key() {
    let store = Arc::new(MemoryStore::new());
    let writer = PatchWriter::new(store.clone());
    let ns = Namespace::new("corpus", "item").unwrap();

    let first = writer.write(&ns, &put_patch("x", 1)).await.unwrap();
    let second = writer.write(&ns, &put_patch("x", 1)).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn distinct_patches_get_distinct_keys() {
    let store = Arc::new(MemoryStore::new());
    let writer = PatchWriter::new(store.clone());
    let ns = Namespace::new("corpus", "item").unwrap();

    let put = writer.write(&ns, &put_patch("x", 1)).await.unwrap();
    let resplayed = writer.write(&ns, &put_patch("x", 2)).await.unwrap();
    let delete = writer
        .write(
            &ns,
            &Patch {
                action: PatchAction::Delete,
                ..put_patch("x", 1)
            },
        )
        .await
        .unwrap();

    assert_ne!(put, resplayed);
    assert_ne!(put, delete);
    assert_eq!(store.len().await, 3);
}

#[tokio::test]
async fn stored_patch_parses_back() {
    let store = Arc::new(MemoryStore::new());
    let writer = PatchWriter::new(store.clone());
    let ns = Namespace::new("corpus", "item").unwrap();

    let patch = put_patch("some-item", 2);
    let key = writer.write(&ns, &patch).await.unwrap();

    let body = store.get_object(&key).await.unwrap();
    let raw: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(raw["action"], "PUT");
    assert_eq!(raw["data"]["type"], "item");

    let parsed: Patch = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed, patch);
}
