//! Public facade over the index coordination subsystem.

use crate::entry::{IndexEntry, Namespace, Patch, PatchAction};
use crate::error::{IndexError, IndexResult};
use crate::lock::LockConfig;
use crate::merge::{MergeOutcome, Merger};
use crate::patch::PatchWriter;
use crate::reader::IndexReader;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use stowage_store::ObjectStore;
use tokio::time::sleep;
use tracing::debug;

/// Tuning for the indexer.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Upper bound of the randomized delay between recording a patch and
    /// attempting the merge. Spreads racing callers out across the lock;
    /// correctness never depends on it.
    pub splay_delay: Duration,
    /// Lock acquisition tuning.
    pub lock: LockConfig,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            splay_delay: Duration::from_millis(300),
            lock: LockConfig::default(),
        }
    }
}

/// Maintains sharded secondary indices over an object store.
///
/// Writers from any number of processes call [`Indexer::patch_index`];
/// each call durably queues one mutation, then races the other callers to
/// fold the namespace's whole backlog into its shard files. Readers use
/// [`Indexer::list_indices`] and [`Indexer::get_index`].
pub struct Indexer {
    config: IndexConfig,
    writer: PatchWriter,
    merger: Merger,
    reader: IndexReader,
}

impl Indexer {
    /// Creates an indexer with default tuning.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self::with_config(store, IndexConfig::default())
    }

    /// Creates an indexer with explicit tuning.
    pub fn with_config(store: Arc<dyn ObjectStore>, config: IndexConfig) -> Self {
        Self {
            writer: PatchWriter::new(Arc::clone(&store)),
            merger: Merger::new(Arc::clone(&store), config.lock.clone()),
            reader: IndexReader::new(store),
            config,
        }
    }

    /// Records one index mutation and makes a best-effort merge attempt.
    ///
    /// `Ok` means the patch is durably recorded and one merge attempt ran;
    /// [`MergeOutcome::Skipped`] means another caller holds the namespace
    /// and will fold the patch in instead. Callers that need convergence
    /// right now follow up with [`Indexer::merge_namespace`].
    pub async fn patch_index(
        &self,
        action: PatchAction,
        prefix: &str,
        item_type: &str,
        id: &str,
        splay: u8,
    ) -> IndexResult<MergeOutcome> {
        if id.trim().is_empty() {
            return Err(IndexError::InvalidArgument(
                "id must not be empty".to_string(),
            ));
        }
        let namespace = Namespace::new(prefix, item_type)?;
        let patch = Patch {
            action,
            data: IndexEntry {
                prefix: namespace.prefix().to_string(),
                item_type: namespace.item_type().to_string(),
                id: id.to_string(),
                splay,
            },
        };

        self.writer.write(&namespace, &patch).await?;
        self.splay_wait().await;
        self.merger.merge(&namespace).await
    }

    /// Runs one merge pass over a namespace right now.
    pub async fn merge_namespace(
        &self,
        prefix: &str,
        item_type: &str,
    ) -> IndexResult<MergeOutcome> {
        self.merger.merge(&Namespace::new(prefix, item_type)?).await
    }

    /// See [`IndexReader::list_indices`].
    pub async fn list_indices(
        &self,
        prefix: &str,
        item_type: Option<&str>,
    ) -> IndexResult<Vec<String>> {
        self.reader.list_indices(prefix, item_type).await
    }

    /// See [`IndexReader::get_index`].
    pub async fn get_index(
        &self,
        prefix: &str,
        item_type: &str,
        file: &str,
    ) -> IndexResult<Option<Vec<IndexEntry>>> {
        self.reader.get_index(prefix, item_type, file).await
    }

    async fn splay_wait(&self) {
        if self.config.splay_delay.is_zero() {
            return;
        }
        let delay = rand::thread_rng().gen_range(Duration::ZERO..self.config.splay_delay);
        debug!(?delay, "splaying before merge attempt");
        sleep(delay).await;
    }
}
