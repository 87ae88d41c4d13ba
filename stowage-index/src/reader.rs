//! Read path over shard files.
//!
//! No coordination: a reader may observe a shard mid-merge. Callers of an
//! eventually-consistent index tolerate stale reads by design.

use crate::entry::{IndexEntry, Namespace};
use crate::error::{IndexError, IndexResult};
use std::sync::Arc;
use stowage_store::{ObjectStore, StoreError};

/// Lists and fetches shard files for external consumption.
pub struct IndexReader {
    store: Arc<dyn ObjectStore>,
}

impl IndexReader {
    /// Creates a reader over `store`.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Lists shard keys under `prefix`, optionally narrowed to one type.
    ///
    /// Pending patches and lock sentinels live alongside the shards and
    /// are filtered out.
    pub async fn list_indices(
        &self,
        prefix: &str,
        item_type: Option<&str>,
    ) -> IndexResult<Vec<String>> {
        if prefix.trim().is_empty() {
            return Err(IndexError::InvalidArgument(
                "prefix must not be empty".to_string(),
            ));
        }
        let root = match item_type {
            Some(item_type) => format!("{}/", Namespace::new(prefix, item_type)?.root()),
            None => format!("{}/indices/", prefix.to_lowercase()),
        };

        let keys = self.store.list_all(&root).await?;
        Ok(keys
            .into_iter()
            .filter(|key| key.ends_with(".json"))
            .collect())
    }

    /// Fetches one shard file, e.g. `"t.json"`. Returns `None` if the
    /// shard does not exist yet.
    pub async fn get_index(
        &self,
        prefix: &str,
        item_type: &str,
        file: &str,
    ) -> IndexResult<Option<Vec<IndexEntry>>> {
        let namespace = Namespace::new(prefix, item_type)?;
        let key = format!("{}/{file}", namespace.root());
        match self.store.get_object(&key).await {
            Ok(body) => Ok(Some(serde_json::from_slice(&body)?)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}
