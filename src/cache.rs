//! In-memory expiring cache with lazy eviction.
//!
//! Entries carry their own expiry instant. Expiry is only checked on `get`: a
//! stale entry is removed by the read that finds it, and there is no background
//! sweep. Entries that expire and are never read again stay resident, so keys
//! must not be attacker-controlled. The asset caches key on canonical paths of
//! files that exist under the web folder, never on the raw request path.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    expiry: Instant,
}

/// Key/value store with per-entry TTL. Owned by `AppState` and shared by reference.
#[derive(Debug)]
pub struct ExpiringCache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
}

impl<V> Default for ExpiringCache<V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<V: Clone> ExpiringCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key` until `ttl` elapses, replacing any prior entry.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        let expiry = Instant::now() + ttl;
        tracing::debug!(key = %key, expire_secs = ttl.as_secs_f64(), "Cache key created");
        self.lock().insert(key, CacheEntry { value, expiry });
    }

    /// Return the value if present and unexpired; evict it if it has expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.expiry > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                tracing::debug!(key = %key, "Cache key expired, evicting");
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Number of resident entries, expired or not.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry<V>>> {
        // A panic while holding the lock cannot leave the map half-updated
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
