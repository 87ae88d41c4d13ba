//! Sharded secondary index coordination for Stowage.
//!
//! Maintains indices that map `(prefix, type, id-prefix)` to lists of item
//! descriptors on top of a flat, eventually-consistent object store, kept
//! correct under many concurrent writers that share no in-process state
//! and have no transactional primitive in the store.
//!
//! # Architecture
//!
//! - **Namespace / key layout**: `(prefix, type)` scopes one independent
//!   index. Entries shard by the lower-cased first character of their id
//!   into `<prefix>/indices/<type>/<char>.json`.
//! - **Patches**: writers never touch shards directly. Each mutation is
//!   queued as an immutable, content-addressed patch object next to the
//!   shards.
//! - **Lock**: an advisory sentinel object serializes merge passes per
//!   namespace. Acquisition is an atomic conditional create; sentinels
//!   leaked by crashed holders expire after a TTL.
//! - **Merge**: the convergence engine folds the namespace's entire patch
//!   backlog into the shards and writes them back as full replacements.
//!   Merges are idempotent, so racing callers converge on the same state.
//! - **Reader**: uncoordinated listing and fetching of shard files.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use stowage_index::Indexer;
//! use stowage_store::MemoryStore;
//!
//! let indexer = Indexer::new(Arc::new(MemoryStore::new()));
//! ```

mod entry;
mod error;
mod indexer;
mod lock;
mod merge;
mod patch;
mod reader;

pub use entry::{DEFAULT_SPLAY, IndexEntry, Namespace, Patch, PatchAction};
pub use error::{IndexError, IndexResult};
pub use indexer::{IndexConfig, Indexer};
pub use lock::{LockAttempt, LockConfig, NamespaceLock};
pub use merge::{MergeOutcome, Merger, fold_patches};
pub use patch::PatchWriter;
pub use reader::IndexReader;
