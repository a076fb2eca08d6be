use std::sync::{Arc, Weak};
use std::time::Duration;

use moka::future::Cache;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::types::{LookupResult, TransactionRecord};

/// How long a cached record stays valid.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// How often the background sweeper runs the cache's pending maintenance.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

// ==============================================================================
// Result Cache
// ==============================================================================

/// Time-bounded in-memory map from transaction hash to its record.
///
/// Shared between the lookup service and the sweeper via `Arc<ResultCache>`.
/// Expired entries read as misses straight away; their memory is reclaimed
/// on the next maintenance pass. There is no negative caching: unknown hashes
/// are simply absent.
pub struct ResultCache {
    entries: Cache<String, TransactionRecord>,
    ttl: Duration,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Cache::builder().time_to_live(ttl).build(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn set(&self, record: TransactionRecord) {
        trace!(hash = %record.hash, "caching transaction");
        self.entries.insert(record.hash.clone(), record).await;
    }

    pub async fn set_many(&self, records: &[TransactionRecord]) {
        if records.is_empty() {
            return;
        }
        debug!(count = records.len(), "caching transactions");
        for record in records {
            self.entries
                .insert(record.hash.clone(), record.clone())
                .await;
        }
    }

    pub async fn get(&self, hash: &str) -> Option<TransactionRecord> {
        self.entries.get(hash).await
    }

    /// Split `hashes` into cached records and misses.
    pub async fn get_many(&self, hashes: &[String]) -> LookupResult {
        let mut result = LookupResult::default();

        for hash in hashes {
            match self.entries.get(hash).await {
                Some(record) => {
                    result.found.push(record);
                    result.found_hashes.push(hash.clone());
                }
                None => result.missing.push(hash.clone()),
            }
        }

        result
    }

    /// Evict expired entries now instead of waiting for the cache to do it
    /// on its own schedule.
    pub async fn sweep_expired(&self) {
        self.entries.run_pending_tasks().await;
    }

    /// Number of live entries after pending evictions have been applied.
    pub async fn len(&self) -> usize {
        self.entries.run_pending_tasks().await;
        usize::try_from(self.entries.entry_count()).unwrap_or(usize::MAX)
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

// ==============================================================================
// Sweeper
// ==============================================================================

/// Periodically sweep `cache`. The task ends once every other `Arc` to the
/// cache has been dropped.
pub fn spawn_sweeper(cache: &Arc<ResultCache>, every: Duration) -> JoinHandle<()> {
    let weak: Weak<ResultCache> = Arc::downgrade(cache);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let Some(cache) = weak.upgrade() else {
                debug!("cache dropped; stopping sweeper");
                return;
            };
            cache.sweep_expired().await;
            trace!(entries = cache.entries.entry_count(), "swept result cache");
        }
    })
}
