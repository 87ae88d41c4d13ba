//! In-memory object store backend.
//!
//! Deterministic backend for tests and embedded setups. Keys are held in a
//! `BTreeMap` so listings come back in lexicographic order, matching how
//! S3 lists a bucket.

use crate::error::{StoreError, StoreResult};
use crate::store::{ListPage, ObjectStat, ObjectStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone)]
struct StoredObject {
    body: Vec<u8>,
    modified_at: DateTime<Utc>,
}

/// In-memory [`ObjectStore`] implementation.
///
/// Each store method takes the interior lock exactly once, so individual
/// operations are atomic — the same guarantee the S3 backend gives.
pub struct MemoryStore {
    objects: Arc<RwLock<BTreeMap<String, StoredObject>>>,
    page_size: usize,
}

impl MemoryStore {
    /// Creates an empty store with an S3-like page size of 1000 keys.
    pub fn new() -> Self {
        Self::with_page_size(1000)
    }

    /// Creates an empty store with a custom listing page size.
    ///
    /// Small page sizes force callers through the continuation-token path.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            objects: Arc::new(RwLock::new(BTreeMap::new())),
            page_size: page_size.max(1),
        }
    }

    /// Returns the number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Returns whether the store holds no objects.
    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.objects.read().await.contains_key(key))
    }

    async fn put_object(&self, key: &str, body: &[u8]) -> StoreResult<()> {
        let object = StoredObject {
            body: body.to_vec(),
            modified_at: Utc::now(),
        };
        self.objects.write().await.insert(key.to_string(), object);
        Ok(())
    }

    async fn put_object_if_absent(&self, key: &str, body: &[u8]) -> StoreResult<bool> {
        let mut objects = self.objects.write().await;
        if objects.contains_key(key) {
            return Ok(false);
        }
        objects.insert(
            key.to_string(),
            StoredObject {
                body: body.to_vec(),
                modified_at: Utc::now(),
            },
        );
        Ok(true)
    }

    async fn get_object(&self, key: &str) -> StoreResult<Vec<u8>> {
        self.objects
            .read()
            .await
            .get(key)
            .map(|o| o.body.clone())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn list_objects(&self, prefix: &str, token: Option<&str>) -> StoreResult<ListPage> {
        let objects = self.objects.read().await;
        let mut keys = Vec::new();
        let mut next_token = None;

        for key in objects
            .range(prefix.to_string()..)
            .map(|(k, _)| k)
            .take_while(|k| k.starts_with(prefix))
            .filter(|k| token.map_or(true, |t| k.as_str() > t))
        {
            if keys.len() == self.page_size {
                next_token = keys.last().cloned();
                break;
            }
            keys.push(key.clone());
        }

        Ok(ListPage { keys, next_token })
    }

    async fn delete_objects(&self, keys: &[String]) -> StoreResult<()> {
        let mut objects = self.objects.write().await;
        for key in keys {
            if objects.remove(key).is_none() {
                debug!(key, "delete of absent key, ignoring");
            }
        }
        Ok(())
    }

    async fn stat(&self, key: &str) -> StoreResult<Option<ObjectStat>> {
        Ok(self.objects.read().await.get(key).map(|o| ObjectStat {
            key: key.to_string(),
            size: o.body.len() as u64,
            last_modified: Some(o.modified_at),
        }))
    }
}
