//! Process-wide named mutexes.
//!
//! `LockService` maps arbitrary string keys to lazily created mutexes for
//! caller-defined critical sections (refreshing a shared credential, a
//! one-at-a-time maintenance job). The cache never looks at these.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

/// Registry of named mutexes.
pub struct LockService {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl LockService {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Acquire the named mutex, suspending until it is available.
    pub async fn lock(&self, key: impl Into<String>) -> LockHandle {
        let key = key.into();
        let mutex = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = mutex.lock_owned().await;
        trace!(%key, "named lock acquired");
        LockHandle {
            key,
            guard: Some(guard),
        }
    }

    /// Number of registered mutexes (held or idle).
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    /// Drop mutexes nobody currently holds. Returns how many were removed.
    ///
    /// The registry otherwise only grows; long-lived processes can sweep it
    /// on whatever cadence suits them.
    pub fn purge_idle(&self) -> usize {
        let before = self.locks.len();
        // A held mutex is kept alive by its guard's Arc clone.
        self.locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
        before - self.locks.len()
    }
}

impl Default for LockService {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped ownership of one named mutex.
///
/// Releasing twice is a no-op, and dropping an unreleased handle releases
/// it, so the release is exactly-once-effective on every exit path.
pub struct LockHandle {
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl LockHandle {
    /// Release the lock. Idempotent.
    pub fn release(&mut self) {
        if self.guard.take().is_some() {
            trace!(key = %self.key, "named lock released");
        }
    }

    pub fn is_released(&self) -> bool {
        self.guard.is_none()
    }
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        self.release();
    }
}
