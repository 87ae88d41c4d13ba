//! Durable recording of index mutations as content-addressed patch objects.

use crate::entry::{Namespace, Patch};
use crate::error::IndexResult;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use stowage_store::ObjectStore;
use tracing::debug;

/// Writes patches into a namespace's patch area.
pub struct PatchWriter {
    store: Arc<dyn ObjectStore>,
}

impl PatchWriter {
    /// Creates a writer over `store`.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Serializes `patch`, derives its content digest and stores it at the
    /// digest-addressed key. Returns the key.
    ///
    /// The digest is stable for identical input, so writing the same patch
    /// twice lands on the same key and repeats dedupe naturally.
    pub async fn write(&self, namespace: &Namespace, patch: &Patch) -> IndexResult<String> {
        let body = serde_json::to_vec(patch)?;
        let key = namespace.patch_key(&digest_hex(&body));
        self.store.put_object(&key, &body).await?;
        debug!(%namespace, key, action = %patch.action, "recorded index patch");
        Ok(key)
    }
}

/// Hex SHA-256 of a serialized patch.
fn digest_hex(body: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body);
    hex::encode(hasher.finalize())
}
