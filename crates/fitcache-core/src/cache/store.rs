use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// A stored value and the moment it was stored.
#[derive(Debug)]
pub struct Cached<V> {
    pub value: Arc<V>,
    pub fetched_at: DateTime<Utc>,
}

impl<V> Clone for Cached<V> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            fetched_at: self.fetched_at,
        }
    }
}

impl<V> Cached<V> {
    pub fn new(value: V) -> Self {
        Self {
            value: Arc::new(value),
            fetched_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.fetched_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Includes negative ages from clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}

/// Where a value returned by [`ReadThroughCache::lookup`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Served from memory without a fetch.
    Cache,
    /// Fetched just now and stored.
    Network,
    /// The fetch failed; this is the last value that succeeded.
    StaleFallback,
}

#[derive(Debug)]
pub struct Lookup<V> {
    pub value: Arc<V>,
    pub source: Source,
    pub fetched_at: DateTime<Utc>,
}

impl<V> Lookup<V> {
    fn from_cached(cached: Cached<V>, source: Source) -> Self {
        Self {
            value: cached.value,
            source,
            fetched_at: cached.fetched_at,
        }
    }

    pub fn is_stale(&self) -> bool {
        self.source == Source::StaleFallback
    }
}

struct Slots<K, V> {
    entries: HashMap<K, Cached<V>>,
    locks: HashMap<K, Arc<tokio::sync::Mutex<()>>>,
}

/// In-memory read-through cache with force-refresh and stale-on-error fallback.
///
/// Fetches for the same key are serialized by a per-key async lock held for
/// the whole of [`lookup`](Self::lookup); a caller that waited on the lock
/// re-checks the map and gets the value the previous holder stored.
/// `snapshot`, `put` and `clear` never wait on a fetch.
pub struct ReadThroughCache<K, V> {
    name: &'static str,
    slots: Mutex<Slots<K, V>>,
}

impl<K, V> ReadThroughCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slots: Mutex::new(Slots {
                entries: HashMap::new(),
                locks: HashMap::new(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    // The map only holds plain values, so a panic elsewhere cannot leave it
    // half-updated.
    fn slots(&self) -> MutexGuard<'_, Slots<K, V>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn key_lock(&self, key: &K) -> Arc<tokio::sync::Mutex<()>> {
        let mut slots = self.slots();
        Arc::clone(slots.locks.entry(key.clone()).or_default())
    }

    fn entry(&self, key: &K) -> Option<Cached<V>> {
        self.slots().entries.get(key).cloned()
    }

    fn store(&self, key: K, cached: Cached<V>) {
        self.slots().entries.insert(key, cached);
    }

    /// Current value for `key`, without fetching.
    pub fn snapshot(&self, key: &K) -> Option<Arc<V>> {
        self.slots().entries.get(key).map(|c| Arc::clone(&c.value))
    }

    pub fn fetched_at(&self, key: &K) -> Option<DateTime<Utc>> {
        self.slots().entries.get(key).map(|c| c.fetched_at)
    }

    /// "5m ago" style age of the entry for `key`, or "never".
    pub fn age_display(&self, key: &K) -> String {
        self.entry(key)
            .map(|c| c.age_display())
            .unwrap_or_else(|| "never".to_string())
    }

    /// Overwrite the entry for `key` with a value the caller already knows is current.
    pub fn put(&self, key: K, value: V) -> Arc<V> {
        let cached = Cached::new(value);
        let value = Arc::clone(&cached.value);
        debug!(cache = self.name, key = ?key, "Cache primed");
        self.store(key, cached);
        value
    }

    pub fn clear(&self, key: &K) {
        if self.slots().entries.remove(key).is_some() {
            debug!(cache = self.name, key = ?key, "Cache entry cleared");
        }
    }

    pub fn clear_all(&self) {
        let mut slots = self.slots();
        let count = slots.entries.len();
        slots.entries.clear();
        debug!(cache = self.name, count, "Cache cleared");
    }

    pub fn len(&self) -> usize {
        self.slots().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the cached value for `key`, fetching it first if it is missing
    /// or `force` is set.
    ///
    /// A failed fetch falls back to the previous value when there is one;
    /// the error is returned only when the key has never been stored.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: K, force: bool, fetch: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: Display,
    {
        self.lookup(key, force, fetch).await.map(|l| l.value)
    }

    /// Same as [`get_or_fetch`](Self::get_or_fetch) but reports where the value came from.
    pub async fn lookup<F, Fut, E>(&self, key: K, force: bool, fetch: F) -> Result<Lookup<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: Display,
    {
        let lock = self.key_lock(&key);
        let _guard = lock.lock().await;

        if !force {
            if let Some(hit) = self.entry(&key) {
                debug!(cache = self.name, key = ?key, "Cache hit");
                return Ok(Lookup::from_cached(hit, Source::Cache));
            }
        }

        debug!(cache = self.name, key = ?key, force, "Fetching");
        match fetch().await {
            Ok(value) => {
                let cached = Cached::new(value);
                self.store(key, cached.clone());
                Ok(Lookup::from_cached(cached, Source::Network))
            }
            Err(e) => match self.entry(&key) {
                Some(stale) => {
                    warn!(
                        cache = self.name,
                        key = ?key,
                        error = %e,
                        age = %stale.age_display(),
                        "Fetch failed, serving cached value"
                    );
                    Ok(Lookup::from_cached(stale, Source::StaleFallback))
                }
                None => {
                    warn!(cache = self.name, key = ?key, error = %e, "Fetch failed with nothing cached");
                    Err(e)
                }
            },
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
