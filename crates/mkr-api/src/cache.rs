//! Time-boxed memoization for backend query results.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::trace;

/// A cached value with its expiry deadline.
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    expires_at: Instant,
}

/// Keyed TTL cache for one resource kind.
///
/// Entries expire a fixed interval after insertion and are dropped lazily on
/// the next lookup. There is no size bound: the key space (structure, chair,
/// faculty, group and date-window combinations) stays small in practice.
#[derive(Debug)]
pub(crate) struct TtlCache<T> {
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
    ttl: Duration,
}

impl<T: Clone> TtlCache<T> {
    pub(crate) fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Look up a live entry, dropping it instead when it has expired.
    pub(crate) async fn get(&self, key: &str) -> Option<T> {
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(entry) if Instant::now() > entry.expires_at => {
                trace!(key, "cache entry expired");
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    /// Store a value, stamping its expiry from the configured TTL.
    pub(crate) async fn insert(&self, key: impl Into<String>, value: T) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + self.ttl,
        };
        self.entries.write().await.insert(key.into(), entry);
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
