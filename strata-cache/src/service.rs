//! Keyed, stampede-safe memoization.
//!
//! Two registries back the service: `entries` is the value store, `locks`
//! is both the per-key flight mutex table and the tracked-key registry.
//! The mutex guards only the compute-and-store step for its own key; no
//! global lock is ever held across a factory invocation.

use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::config::CacheSettings;

/// Separator between cache key parts.
pub const KEY_SEPARATOR: &str = "__";

/// Type-erased cached value, as handed back by [`CacheService::snapshot`].
pub type CachedValue = Arc<dyn Any + Send + Sync>;

/// Join key parts into one composite key.
pub fn compose_key(parts: &[String]) -> String {
    parts.join(KEY_SEPARATOR)
}

struct Entry {
    value: CachedValue,
    inserted_at: Instant,
    last_access: Instant,
}

enum Probe<T> {
    Hit(T),
    Miss,
    Expired,
}

/// Single-flight memoizing cache with hierarchical invalidation.
pub struct CacheService {
    settings: CacheSettings,
    entries: DashMap<String, Entry>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl CacheService {
    pub fn new(settings: CacheSettings) -> Self {
        Self {
            settings,
            entries: DashMap::new(),
            locks: DashMap::new(),
        }
    }

    /// Look up the composite key, computing and storing on miss.
    ///
    /// Empty `parts` bypass caching entirely: the factory runs every call.
    /// Otherwise at most one factory is in flight per key; concurrent
    /// callers suspend on the per-key mutex and read the stored value once
    /// it lands. The lookup performed after acquiring the mutex is the
    /// authoritative one; the earlier lookup is only a fast-path hint.
    /// Factory errors propagate and cache nothing.
    pub async fn get_or_create<T, E, F, Fut>(&self, parts: &[String], factory: F) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if parts.is_empty() {
            return factory().await;
        }
        let key = compose_key(parts);

        // A key without a flight lock is untracked; drop any orphaned value
        // so the registry and the value store converge.
        if !self.locks.contains_key(&key) {
            self.entries.remove(&key);
        }

        match self.probe::<T>(&key) {
            Probe::Hit(value) => {
                trace!(%key, "cache hit");
                return Ok(value);
            }
            Probe::Expired => {
                self.remove_expired(&key);
            }
            Probe::Miss => {}
        }

        let lock = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _flight = lock.lock().await;

        match self.probe::<T>(&key) {
            Probe::Hit(value) => {
                trace!(%key, "cache hit after flight wait");
                return Ok(value);
            }
            Probe::Expired => {
                self.remove_expired(&key);
            }
            Probe::Miss => {}
        }

        let value = factory().await?;
        let now = Instant::now();
        self.entries.insert(
            key.clone(),
            Entry {
                value: Arc::new(value.clone()),
                inserted_at: now,
                last_access: now,
            },
        );
        debug!(%key, "cache miss, populated");
        Ok(value)
    }

    /// Cache only when `condition` holds; otherwise invoke the factory
    /// directly.
    pub async fn get_or_create_if<T, E, F, Fut>(
        &self,
        condition: bool,
        parts: &[String],
        factory: F,
    ) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if condition {
            self.get_or_create(parts, factory).await
        } else {
            factory().await
        }
    }

    /// Remove the exact composite key and every tracked key under it in the
    /// hierarchy (prefixed by the key plus the part separator,
    /// case-insensitively).
    pub fn remove(&self, parts: &[String]) {
        if parts.is_empty() {
            return;
        }
        let key = compose_key(parts);
        self.remove_key(&key);
        let prefix = format!("{key}{KEY_SEPARATOR}").to_lowercase();
        let removed = self.remove_matching(|tracked| tracked.starts_with(&prefix));
        debug!(%key, removed = removed + 1, "cache invalidated");
    }

    /// Remove every tracked key with the given case-insensitive prefix.
    pub fn remove_starts_with(&self, parts: &[String]) {
        let prefix = compose_key(parts).to_lowercase();
        let removed = self.remove_matching(|tracked| tracked.starts_with(&prefix));
        debug!(%prefix, removed, "cache invalidated by prefix");
    }

    /// Remove every tracked key containing the given case-insensitive
    /// fragment.
    pub fn remove_contains(&self, parts: &[String]) {
        let fragment = compose_key(parts).to_lowercase();
        let removed = self.remove_matching(|tracked| tracked.contains(&fragment));
        debug!(%fragment, removed, "cache invalidated by fragment");
    }

    /// Evict everything.
    pub fn remove_all(&self) {
        self.entries.clear();
        self.locks.clear();
        debug!("cache cleared");
    }

    /// Tracked keys, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.locks.iter().map(|e| e.key().clone()).collect()
    }

    /// Tracked keys with their current values, without touching sliding
    /// expirations. Keys whose value has expired or has not landed yet
    /// carry `None`.
    pub fn snapshot(&self) -> Vec<(String, Option<CachedValue>)> {
        let now = Instant::now();
        self.keys()
            .into_iter()
            .map(|key| {
                let value = self.entries.get(&key).and_then(|entry| {
                    if self.is_expired(&entry, now) {
                        None
                    } else {
                        Some(entry.value.clone())
                    }
                });
                (key, value)
            })
            .collect()
    }

    /// Number of values currently stored.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Sweep expired values, and drop the flight lock of any swept key that
    /// is currently uncontended. Keeps both registries from growing without
    /// bound in long-lived processes.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| self.is_expired(entry.value(), now))
            .map(|entry| entry.key().clone())
            .collect();
        let mut removed = 0;
        for key in expired {
            if self.remove_expired(&key) {
                removed += 1;
            }
            let lock = self.locks.get(&key).map(|e| e.value().clone());
            if let Some(lock) = lock {
                if let Ok(_guard) = lock.try_lock() {
                    self.locks.remove(&key);
                }
            }
        }
        if removed > 0 {
            debug!(removed, "purged expired cache entries");
        }
        removed
    }

    fn probe<T: Clone + Send + Sync + 'static>(&self, key: &str) -> Probe<T> {
        let now = Instant::now();
        match self.entries.get_mut(key) {
            None => Probe::Miss,
            Some(mut entry) => {
                if self.is_expired(&entry, now) {
                    Probe::Expired
                } else {
                    entry.last_access = now;
                    match entry.value.clone().downcast::<T>() {
                        Ok(value) => Probe::Hit((*value).clone()),
                        Err(_) => Probe::Miss,
                    }
                }
            }
        }
    }

    fn is_expired(&self, entry: &Entry, now: Instant) -> bool {
        now.duration_since(entry.inserted_at) >= self.settings.max_ttl
            || now.duration_since(entry.last_access) >= self.settings.ttl
    }

    fn remove_expired(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries
            .remove_if(key, |_, entry| self.is_expired(entry, now))
            .is_some()
    }

    fn remove_key(&self, key: &str) {
        self.locks.remove(key);
        self.entries.remove(key);
    }

    fn remove_matching(&self, matches: impl Fn(&str) -> bool) -> usize {
        let doomed: Vec<String> = self
            .locks
            .iter()
            .map(|e| e.key().clone())
            .filter(|k| matches(&k.to_lowercase()))
            .collect();
        for key in &doomed {
            self.remove_key(key);
        }
        doomed.len()
    }
}

impl Default for CacheService {
    fn default() -> Self {
        Self::new(CacheSettings::default())
    }
}
