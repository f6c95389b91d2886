//! Persistence-collaborator traits and the in-memory reference store.
//!
//! [`EntityStore`] is the unit-of-work seam: writes are staged and take
//! effect only when `save_changes` commits them, returning the affected-row
//! count the service layer keys its cache invalidation on.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use strata_core::{FieldValue, Record, StoreError, StoreResult};
use tokio::sync::{Mutex, RwLock};

use crate::transaction::{RetryStrategy, TransactionHost};

/// Storage for one entity type.
#[async_trait]
pub trait EntityStore<E: Record>: Send + Sync {
    /// Untracked snapshot of every row.
    async fn scan(&self) -> StoreResult<Vec<E>>;

    /// Stage an insert.
    async fn add(&self, entity: E) -> StoreResult<()>;

    /// Stage a replacement of the row with the same identity.
    async fn update(&self, entity: E) -> StoreResult<()>;

    /// Stage a removal of the row with the same identity.
    async fn remove(&self, entity: &E) -> StoreResult<()>;

    /// Commit staged writes. Returns the number of affected rows.
    async fn save_changes(&self) -> StoreResult<usize>;
}

enum Pending<E> {
    Insert(E),
    Update(E),
    Remove(Vec<FieldValue>),
}

/// Reference store backing the test suites: rows behind an `RwLock`, staged
/// writes applied on commit, and counters for asserting what a scenario
/// actually touched. `fail_transient` injects failures for retry tests.
pub struct InMemoryStore<E: Record> {
    rows: RwLock<Vec<E>>,
    pending: Mutex<Vec<Pending<E>>>,
    scans: AtomicUsize,
    saves: AtomicUsize,
    transient_failures: AtomicUsize,
    tx_active: AtomicBool,
    tx_begun: AtomicUsize,
}

impl<E: Record> InMemoryStore<E> {
    pub fn new() -> Self {
        Self::with_rows(Vec::new())
    }

    pub fn with_rows(rows: Vec<E>) -> Self {
        Self {
            rows: RwLock::new(rows),
            pending: Mutex::new(Vec::new()),
            scans: AtomicUsize::new(0),
            saves: AtomicUsize::new(0),
            transient_failures: AtomicUsize::new(0),
            tx_active: AtomicBool::new(false),
            tx_begun: AtomicUsize::new(0),
        }
    }

    /// Make the next `count` commits fail with a transient error.
    pub fn fail_transient(&self, count: usize) {
        self.transient_failures.store(count, Ordering::SeqCst);
    }

    /// How many times `scan` has run.
    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }

    /// How many times `save_changes` has run, failed attempts included.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// How many transactions have been opened.
    pub fn transactions_begun(&self) -> usize {
        self.tx_begun.load(Ordering::SeqCst)
    }

    fn identity_of(entity: &E) -> Vec<FieldValue> {
        E::schema().identity_values(entity)
    }
}

impl<E: Record> Default for InMemoryStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: Record> EntityStore<E> for InMemoryStore<E> {
    async fn scan(&self) -> StoreResult<Vec<E>> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        Ok(self.rows.read().await.clone())
    }

    async fn add(&self, entity: E) -> StoreResult<()> {
        self.pending.lock().await.push(Pending::Insert(entity));
        Ok(())
    }

    async fn update(&self, entity: E) -> StoreResult<()> {
        self.pending.lock().await.push(Pending::Update(entity));
        Ok(())
    }

    async fn remove(&self, entity: &E) -> StoreResult<()> {
        self.pending
            .lock()
            .await
            .push(Pending::Remove(Self::identity_of(entity)));
        Ok(())
    }

    async fn save_changes(&self) -> StoreResult<usize> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        let remaining = self
            .transient_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if remaining {
            return Err(StoreError::Transient {
                reason: "injected failure".into(),
            });
        }

        let staged: Vec<Pending<E>> = self.pending.lock().await.drain(..).collect();
        let mut rows = self.rows.write().await;
        let mut affected = 0;
        for op in staged {
            match op {
                Pending::Insert(entity) => {
                    rows.push(entity);
                    affected += 1;
                }
                Pending::Update(entity) => {
                    let keys = Self::identity_of(&entity);
                    if let Some(row) = rows.iter_mut().find(|r| Self::identity_of(r) == keys) {
                        *row = entity;
                        affected += 1;
                    }
                }
                Pending::Remove(keys) => {
                    let before = rows.len();
                    rows.retain(|r| Self::identity_of(r) != keys);
                    affected += before - rows.len();
                }
            }
        }
        Ok(affected)
    }
}

#[async_trait]
impl<E: Record> TransactionHost for InMemoryStore<E> {
    fn in_transaction(&self) -> bool {
        self.tx_active.load(Ordering::SeqCst)
    }

    async fn begin(&self) -> StoreResult<()> {
        if self.tx_active.swap(true, Ordering::SeqCst) {
            return Err(StoreError::Backend {
                reason: "transaction already active".into(),
            });
        }
        self.tx_begun.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn commit(&self) -> StoreResult<()> {
        self.tx_active.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(&self) -> StoreResult<()> {
        self.tx_active.store(false, Ordering::SeqCst);
        self.pending.lock().await.clear();
        Ok(())
    }

    fn retry_strategy(&self) -> RetryStrategy {
        RetryStrategy::default()
    }
}
