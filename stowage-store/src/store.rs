//! Object store abstraction trait.
//!
//! Defines the common interface over flat key/object backends.

use crate::error::StoreResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata about a stored object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStat {
    /// Full object key.
    pub key: String,
    /// Object size in bytes.
    pub size: u64,
    /// Last modification time, when the backend reports one.
    pub last_modified: Option<DateTime<Utc>>,
}

/// One page of a key listing.
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    /// Keys in this page, in lexicographic order.
    pub keys: Vec<String>,
    /// Continuation token for the next page. `None` when exhausted.
    pub next_token: Option<String>,
}

/// Abstract flat object store.
///
/// Implementations must be safe for concurrent use from many tasks and
/// processes. Multi-step sequences built on top of this trait get no
/// atomicity beyond the single call: every method is a suspension point
/// where another caller's operations may interleave.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Returns the name of the backend.
    fn backend_name(&self) -> &'static str;

    /// Returns whether an object exists at `key`.
    async fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Writes an object, replacing any previous contents (last-write-wins).
    async fn put_object(&self, key: &str, body: &[u8]) -> StoreResult<()>;

    /// Writes an object only if `key` is currently absent.
    ///
    /// Returns `true` if this call created the object, `false` if the key
    /// already existed (or a concurrent conditional write won). The
    /// check-and-create is atomic on the backend.
    async fn put_object_if_absent(&self, key: &str, body: &[u8]) -> StoreResult<bool>;

    /// Reads an object's contents. Fails with [`StoreError::NotFound`]
    /// if the key is absent.
    ///
    /// [`StoreError::NotFound`]: crate::StoreError::NotFound
    async fn get_object(&self, key: &str) -> StoreResult<Vec<u8>>;

    /// Lists one page of keys starting with `prefix`.
    async fn list_objects(&self, prefix: &str, token: Option<&str>) -> StoreResult<ListPage>;

    /// Deletes the given keys. Keys that do not exist are ignored.
    async fn delete_objects(&self, keys: &[String]) -> StoreResult<()>;

    /// Returns metadata for an object, or `None` if it does not exist.
    async fn stat(&self, key: &str) -> StoreResult<Option<ObjectStat>>;

    /// Drains the paginated listing into a full key list, following
    /// continuation tokens with an explicit cursor.
    async fn list_all(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let page = self.list_objects(prefix, token.as_deref()).await?;
            keys.extend(page.keys);
            match page.next_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }
        Ok(keys)
    }
}
