//! Advisory per-namespace locking via a sentinel object.
//!
//! The sentinel at `<namespace>/.update` carries only a timestamp; its
//! existence means "a merge may be in progress". Acquisition is an atomic
//! conditional create, so two callers can never both believe they created
//! it. A sentinel older than [`LockConfig::stale_after`] is treated as
//! leaked by a crashed holder and reclaimed; a fresh sentinel that
//! outlives every retry means another healthy merger is active, and the
//! caller backs off instead of overriding it.

use crate::entry::Namespace;
use crate::error::IndexResult;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use stowage_store::{ObjectStore, StoreError};
use tokio::time::sleep;
use tracing::{debug, warn};

/// Lock acquisition tuning.
#[derive(Debug, Clone)]
pub struct LockConfig {
    /// How many acquisition attempts before reporting contention.
    pub max_attempts: u32,
    /// Lower bound of the randomized delay between attempts.
    pub retry_delay_min: Duration,
    /// Upper bound of the randomized delay between attempts.
    pub retry_delay_max: Duration,
    /// Age beyond which a sentinel is considered leaked and reclaimable.
    pub stale_after: Duration,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_min: Duration::from_secs(1),
            retry_delay_max: Duration::from_secs(2),
            stale_after: Duration::from_secs(60),
        }
    }
}

/// Body of the sentinel object.
#[derive(Debug, Serialize, Deserialize)]
struct Sentinel {
    date: DateTime<Utc>,
}

/// Outcome of a lock attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockAttempt {
    /// The caller holds the namespace until [`NamespaceLock::release`].
    Acquired,
    /// A fresh sentinel outlived every retry — someone else is merging.
    Contended,
}

/// Advisory lock over one namespace's merge activity.
pub struct NamespaceLock {
    store: Arc<dyn ObjectStore>,
    config: LockConfig,
}

impl NamespaceLock {
    /// Creates a lock coordinator over `store`.
    pub fn new(store: Arc<dyn ObjectStore>, config: LockConfig) -> Self {
        Self { store, config }
    }

    /// Tries to take the namespace, retrying with randomized backoff.
    pub async fn acquire(&self, namespace: &Namespace) -> IndexResult<LockAttempt> {
        let key = namespace.sentinel_key();
        for attempt in 1..=self.config.max_attempts {
            let sentinel = serde_json::to_vec(&Sentinel { date: Utc::now() })?;
            if self.store.put_object_if_absent(&key, &sentinel).await? {
                debug!(%namespace, attempt, "acquired namespace lock");
                return Ok(LockAttempt::Acquired);
            }

            if self.reclaim_if_stale(namespace, &key).await?
                && self.store.put_object_if_absent(&key, &sentinel).await?
            {
                debug!(%namespace, attempt, "acquired namespace lock after reclaim");
                return Ok(LockAttempt::Acquired);
            }

            if attempt < self.config.max_attempts {
                let delay = self.retry_delay();
                debug!(%namespace, attempt, ?delay, "namespace locked, backing off");
                sleep(delay).await;
            }
        }

        warn!(
            %namespace,
            attempts = self.config.max_attempts,
            "namespace still locked, leaving backlog for the active merger"
        );
        Ok(LockAttempt::Contended)
    }

    /// Removes the sentinel.
    pub async fn release(&self, namespace: &Namespace) -> IndexResult<()> {
        self.store
            .delete_objects(&[namespace.sentinel_key()])
            .await?;
        debug!(%namespace, "released namespace lock");
        Ok(())
    }

    /// Deletes the sentinel if it is older than the stale TTL or
    /// unreadable. Returns whether it was removed.
    async fn reclaim_if_stale(&self, namespace: &Namespace, key: &str) -> IndexResult<bool> {
        let body = match self.store.get_object(key).await {
            Ok(body) => body,
            // The holder released between our create attempt and this read.
            Err(StoreError::NotFound(_)) => return Ok(false),
            Err(err) => return Err(err.into()),
        };

        let Ok(sentinel) = serde_json::from_slice::<Sentinel>(&body) else {
            warn!(%namespace, "unreadable lock sentinel, reclaiming");
            self.store.delete_objects(&[key.to_string()]).await?;
            return Ok(true);
        };

        let age = Utc::now().signed_duration_since(sentinel.date);
        if age.to_std().map_or(false, |age| age > self.config.stale_after) {
            warn!(
                %namespace,
                age_secs = age.num_seconds(),
                "reclaiming stale lock sentinel"
            );
            self.store.delete_objects(&[key.to_string()]).await?;
            return Ok(true);
        }

        Ok(false)
    }

    fn retry_delay(&self) -> Duration {
        let min = self.config.retry_delay_min;
        let max = self.config.retry_delay_max.max(min);
        if max == min {
            return min;
        }
        rand::thread_rng().gen_range(min..max)
    }
}
