use std::sync::Arc;
use std::time::Duration;
use stowage_index::{IndexConfig, IndexError, Indexer, LockConfig, PatchAction};
use stowage_store::{MemoryStore, ObjectStore};

fn indexer(store: &Arc<MemoryStore>) -> Indexer {
    Indexer::with_config(
        store.clone() as Arc<dyn ObjectStore>,
        IndexConfig {
            splay_delay: Duration::ZERO,
            lock: LockConfig {
                max_attempts: 3,
                retry_delay_min: Duration::from_millis(2),
                retry_delay_max: Duration::from_millis(6),
                stale_after: Duration::from_secs(60),
            },
        },
    )
}

#[tokio::test]
async fn lists_one_shard_key_per_type_and_first_character() {
    let store = Arc::new(MemoryStore::new());
    let indexer = indexer(&store);

    for (item_type, id) in [
        ("item", "alpha"),
        ("item", "another"),
        ("item", "beta"),
        ("collection", "alpha"),
    ] {
        indexer
            .patch_index(PatchAction::Put, "corpus", item_type, id, 1)
            .await
            .unwrap();
    }

    let mut keys = indexer.list_indices("corpus", None).await.unwrap();
    keys.sort();
    assert_eq!(
        keys,
        vec![
            "corpus/indices/collection/a.json".to_string(),
            "corpus/indices/item/a.json".to_string(),
            "corpus/indices/item/b.json".to_string(),
        ]
    );
}

#[tokio::test]
async fn listing_narrows_to_one_type() {
    let store = Arc::new(MemoryStore::new());
    let indexer = indexer(&store);

    indexer
        .patch_index(PatchAction::Put, "corpus", "item", "alpha", 1)
        .await
        .unwrap();
    indexer
        .patch_index(PatchAction::Put, "corpus", "collection", "alpha", 1)
        .await
        .unwrap();

    let keys = indexer.list_indices("corpus", Some("item")).await.unwrap();
    assert_eq!(keys, vec!["corpus/indices/item/a.json".to_string()]);
}

#[tokio::test]
async fn listing_hides_patches_and_sentinels() {
    let store = Arc::new(MemoryStore::new());
    let indexer = indexer(&store);

    indexer
        .patch_index(PatchAction::Put, "corpus", "item", "alpha", 1)
        .await
        .unwrap();
    // A pending patch and an in-progress merge marker from other writers.
    store
        .put_object("corpus/indices/item/patch-ffff", b"{}")
        .await
        .unwrap();
    store
        .put_object("corpus/indices/item/.update", b"{}")
        .await
        .unwrap();

    let keys = indexer.list_indices("corpus", None).await.unwrap();
    assert_eq!(keys, vec!["corpus/indices/item/a.json".to_string()]);
}

#[tokio::test]
async fn listing_normalizes_prefix_case() {
    let store = Arc::new(MemoryStore::new());
    let indexer = indexer(&store);

    indexer
        .patch_index(PatchAction::Put, "corpus", "item", "alpha", 1)
        .await
        .unwrap();

    let keys = indexer.list_indices("CORPUS", None).await.unwrap();
    assert_eq!(keys.len(), 1);
}

#[tokio::test]
async fn absent_shard_reads_as_none() {
    let store = Arc::new(MemoryStore::new());
    let indexer = indexer(&store);

    let shard = indexer.get_index("corpus", "item", "q.json").await.unwrap();
    assert!(shard.is_none());
}

#[tokio::test]
async fn empty_prefix_is_rejected() {
    let store = Arc::new(MemoryStore::new());
    let indexer = indexer(&store);

    assert!(matches!(
        indexer.list_indices("", None).await,
        Err(IndexError::InvalidArgument(_))
    ));
    assert!(matches!(
        indexer.get_index("corpus", "", "a.json").await,
        Err(IndexError::InvalidArgument(_))
    ));
}
