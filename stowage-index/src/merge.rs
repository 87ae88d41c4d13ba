//! The convergence engine: folds pending patches into shard files.
//!
//! A merge pass always reduces the ENTIRE outstanding backlog of a
//! namespace — not just any one caller's patch — and writes each touched
//! shard back as a full replacement. That is what lets many independent
//! writers race to run the merge and still converge on the same shard
//! state: whichever pass wins has folded everything the others queued.
//!
//! The fold itself ([`fold_patches`]) is pure; all I/O and locking lives
//! in [`Merger`].

use crate::entry::{IndexEntry, Namespace, Patch, PatchAction};
use crate::error::IndexResult;
use crate::lock::{LockAttempt, LockConfig, NamespaceLock};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use stowage_store::{ObjectStore, StoreError};
use tracing::{debug, info, warn};

/// What a merge pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Consumed this many pending patches and rewrote the affected shards.
    Applied(usize),
    /// Nothing was pending.
    Empty,
    /// The namespace is locked by another healthy merger; the backlog
    /// stays queued for it.
    Skipped,
}

/// Merges a namespace's patch backlog into its shard files.
pub struct Merger {
    store: Arc<dyn ObjectStore>,
    lock: NamespaceLock,
}

impl Merger {
    /// Creates a merger over `store`.
    pub fn new(store: Arc<dyn ObjectStore>, lock_config: LockConfig) -> Self {
        let lock = NamespaceLock::new(Arc::clone(&store), lock_config);
        Self { store, lock }
    }

    /// Runs one merge pass over `namespace`.
    pub async fn merge(&self, namespace: &Namespace) -> IndexResult<MergeOutcome> {
        match self.lock.acquire(namespace).await? {
            LockAttempt::Acquired => {}
            LockAttempt::Contended => return Ok(MergeOutcome::Skipped),
        }

        let outcome = self.merge_locked(namespace).await;

        // The sentinel must go away even when the pass failed, or the
        // namespace stays wedged until the stale TTL expires.
        if let Err(err) = self.lock.release(namespace).await {
            warn!(%namespace, %err, "failed to release namespace lock");
        }

        outcome
    }

    async fn merge_locked(&self, namespace: &Namespace) -> IndexResult<MergeOutcome> {
        let patch_keys = self.store.list_all(&namespace.patch_prefix()).await?;
        if patch_keys.is_empty() {
            return Ok(MergeOutcome::Empty);
        }
        debug!(%namespace, pending = patch_keys.len(), "merging patch backlog");

        // Read every pending patch. Unreadable or unparseable patches are
        // dropped; their keys are still consumed below, so one poison
        // patch cannot wedge the namespace forever.
        let mut patches = Vec::with_capacity(patch_keys.len());
        for key in &patch_keys {
            let body = match self.store.get_object(key).await {
                Ok(body) => body,
                Err(StoreError::NotFound(_)) => {
                    debug!(%key, "patch vanished between list and read, skipping");
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            match serde_json::from_slice::<Patch>(&body) {
                Ok(patch) => patches.push(patch),
                Err(err) => warn!(%key, %err, "dropping unparseable patch"),
            }
        }

        // Group by target shard, preserving enumeration order within each.
        let mut by_shard: BTreeMap<String, Vec<Patch>> = BTreeMap::new();
        for patch in patches {
            match namespace.shard_key(&patch.data.id) {
                Ok(shard) => by_shard.entry(shard).or_default().push(patch),
                Err(err) => warn!(%err, "dropping unroutable patch"),
            }
        }

        for (shard_key, shard_patches) in &by_shard {
            let existing = self.load_shard(shard_key).await?;
            let merged = fold_patches(existing, shard_patches);
            self.store
                .put_object(shard_key, &serde_json::to_vec(&merged)?)
                .await?;
            debug!(%shard_key, entries = merged.len(), "rewrote shard");
        }

        // Consume the full listed set, unparseable patches included.
        self.store.delete_objects(&patch_keys).await?;

        info!(
            %namespace,
            applied = patch_keys.len(),
            shards = by_shard.len(),
            "merge pass complete"
        );
        Ok(MergeOutcome::Applied(patch_keys.len()))
    }

    /// Loads a shard, treating an absent object as an empty shard.
    async fn load_shard(&self, key: &str) -> IndexResult<Vec<IndexEntry>> {
        match self.store.get_object(key).await {
            Ok(body) => Ok(serde_json::from_slice(&body)?),
            Err(StoreError::NotFound(_)) => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Applies `patches` to a shard's entries in order: PUT appends, DELETE
/// removes every entry with a matching id. The result is deduplicated by
/// id keeping the first occurrence, so a pre-existing entry wins over a
/// conflicting concurrent PUT.
pub fn fold_patches(existing: Vec<IndexEntry>, patches: &[Patch]) -> Vec<IndexEntry> {
    let mut entries = existing;
    for patch in patches {
        match patch.action {
            PatchAction::Put => entries.push(patch.data.clone()),
            PatchAction::Delete => entries.retain(|e| e.id != patch.data.id),
        }
    }

    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| seen.insert(entry.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, splay: u8) -> IndexEntry {
        IndexEntry {
            prefix: "corpus".to_string(),
            item_type: "item".to_string(),
            id: id.to_string(),
            splay,
        }
    }

    fn put(id: &str, splay: u8) -> Patch {
        Patch {
            action: PatchAction::Put,
            data: entry(id, splay),
        }
    }

    fn delete(id: &str) -> Patch {
        Patch {
            action: PatchAction::Delete,
            data: entry(id, 1),
        }
    }

    #[test]
    fn put_appends_and_delete_removes() {
        let folded = fold_patches(vec![], &[put("a", 1), put("b", 1), delete("a")]);
        assert_eq!(folded.len(), 1);
        assert_eq!(folded[0].id, "b");
    }

    #[test]
    fn existing_entry_wins_over_conflicting_put() {
        let folded = fold_patches(vec![entry("a", 1)], &[put("a", 4)]);
        assert_eq!(folded, vec![entry("a", 1)]);
    }

    #[test]
    fn delete_then_put_reinstates_with_new_data() {
        let folded = fold_patches(vec![entry("a", 1)], &[delete("a"), put("a", 4)]);
        assert_eq!(folded, vec![entry("a", 4)]);
    }

    #[test]
    fn delete_of_absent_id_is_a_noop() {
        let folded = fold_patches(vec![entry("a", 1)], &[delete("zzz")]);
        assert_eq!(folded, vec![entry("a", 1)]);
    }
}
