//! Index entry and patch value types, plus the namespace key layout.

use crate::error::IndexError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default splay width for new entries.
pub const DEFAULT_SPLAY: u8 = 1;

fn default_splay() -> u8 {
    DEFAULT_SPLAY
}

/// One entry in a shard file: the descriptor of an item in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Item prefix (top-level grouping), lower-cased.
    pub prefix: String,
    /// Item type, lower-cased.
    #[serde(rename = "type")]
    pub item_type: String,
    /// Caller-supplied item identifier. Case is preserved.
    pub id: String,
    /// Number of leading id characters splayed into the item's path.
    #[serde(default = "default_splay")]
    pub splay: u8,
}

/// Requested mutation of one index entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PatchAction {
    /// Add (or re-assert) the entry.
    Put,
    /// Remove any entry with a matching id.
    Delete,
}

impl fmt::Display for PatchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchAction::Put => write!(f, "PUT"),
            PatchAction::Delete => write!(f, "DELETE"),
        }
    }
}

impl FromStr for PatchAction {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PUT" => Ok(PatchAction::Put),
            "DELETE" => Ok(PatchAction::Delete),
            other => Err(IndexError::InvalidArgument(format!(
                "action must be PUT or DELETE, got {other:?}"
            ))),
        }
    }
}

/// A queued, immutable request to add or remove one index entry.
///
/// Patches decouple writers from the merge process: writers only ever
/// append patch objects; a later merge pass folds the whole backlog into
/// the shard files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patch {
    /// What to do with the entry.
    pub action: PatchAction,
    /// The entry the action applies to.
    pub data: IndexEntry,
}

/// The (prefix, type) pair scoping one independent index.
///
/// A namespace owns its shard files, its pending patches and its lock
/// sentinel; different namespaces never contend with each other. Both
/// components are lower-cased at construction so `("Corpus", "Item")` and
/// `("corpus", "item")` name the same index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    prefix: String,
    item_type: String,
}

impl Namespace {
    /// Creates a normalized namespace. Empty components are rejected.
    pub fn new(prefix: &str, item_type: &str) -> Result<Self, IndexError> {
        if prefix.trim().is_empty() {
            return Err(IndexError::InvalidArgument(
                "prefix must not be empty".to_string(),
            ));
        }
        if item_type.trim().is_empty() {
            return Err(IndexError::InvalidArgument(
                "type must not be empty".to_string(),
            ));
        }
        Ok(Self {
            prefix: prefix.to_lowercase(),
            item_type: item_type.to_lowercase(),
        })
    }

    /// Returns the normalized prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the normalized item type.
    pub fn item_type(&self) -> &str {
        &self.item_type
    }

    /// Root key under which all of this namespace's index objects live.
    pub fn root(&self) -> String {
        format!("{}/indices/{}", self.prefix, self.item_type)
    }

    /// Shard character for an id: its lower-cased first character.
    pub fn shard_char(id: &str) -> Result<char, IndexError> {
        let first = id
            .chars()
            .next()
            .ok_or_else(|| IndexError::InvalidArgument("id must not be empty".to_string()))?;
        Ok(first.to_lowercase().next().unwrap_or(first))
    }

    /// Key of the shard file that holds entries sharing `id`'s first
    /// character.
    pub fn shard_key(&self, id: &str) -> Result<String, IndexError> {
        Ok(format!("{}/{}.json", self.root(), Self::shard_char(id)?))
    }

    /// Key prefix under which this namespace's pending patches live.
    pub fn patch_prefix(&self) -> String {
        format!("{}/patch-", self.root())
    }

    /// Key of one content-addressed patch object.
    pub fn patch_key(&self, digest: &str) -> String {
        format!("{}{digest}", self.patch_prefix())
    }

    /// Key of the advisory lock sentinel.
    pub fn sentinel_key(&self) -> String {
        format!("{}/.update", self.root())
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.prefix, self.item_type)
    }
}
