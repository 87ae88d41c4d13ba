//! Object store backends for Stowage.
//!
//! Everything above this crate talks to a flat, eventually-consistent
//! key/object store through the [`ObjectStore`] trait: AWS S3 (or any
//! S3-compatible service) in production, an ordered in-memory map in tests
//! and embedded setups.
//!
//! The trait surface is deliberately small — existence checks, whole-object
//! get/put, paginated listing, bulk delete, stat — because the coordination
//! layer above builds everything else out of those primitives. Two store
//! properties shape that layer:
//!
//! - Writes to the same key are last-write-wins; there are no multi-key
//!   transactions.
//! - [`ObjectStore::put_object_if_absent`] is the one conditional primitive
//!   (S3 `If-None-Match: *`). It is what makes advisory lock acquisition
//!   atomic.
//!
//! Absent objects are reported as [`StoreError::NotFound`], tagged apart
//! from transport failures, so callers can treat "not there yet" as an
//! expected state without swallowing real errors.

mod error;
mod memory;
mod s3;
mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use s3::{S3Config, S3Store};
pub use store::{ListPage, ObjectStat, ObjectStore};
