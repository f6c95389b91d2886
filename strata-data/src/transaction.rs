//! Retry-aware transactional wrapper.
//!
//! [`ResilientTransaction`] makes a multi-step write execute within exactly
//! one transaction. The retry policy belongs to the persistence
//! collaborator; the wrapper only decides whether a transaction must be
//! opened at all.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use strata_core::StoreResult;
use tracing::warn;

/// Bounded retry policy owned by the persistence collaborator.
///
/// Only transient failures are retried, with exponential backoff between
/// attempts. Anything else propagates immediately, as does a transient
/// failure once attempts are exhausted.
#[derive(Debug, Clone)]
pub struct RetryStrategy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(50),
        }
    }
}

impl RetryStrategy {
    pub async fn execute<T, F, Fut>(&self, mut operation: F) -> StoreResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        let mut attempt = 1u32;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.max_attempts => {
                    let delay = self.base_delay * 2u32.saturating_pow(attempt - 1);
                    warn!(attempt, ?delay, error = %err, "transient store failure, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Transaction surface of a persistence collaborator.
#[async_trait]
pub trait TransactionHost: Send + Sync {
    /// Whether a transaction is already active on this connection.
    fn in_transaction(&self) -> bool;

    async fn begin(&self) -> StoreResult<()>;

    async fn commit(&self) -> StoreResult<()>;

    async fn rollback(&self) -> StoreResult<()>;

    /// The collaborator's own retry policy.
    fn retry_strategy(&self) -> RetryStrategy;
}

/// Runs a unit-of-work action within exactly one transaction.
pub struct ResilientTransaction<'a, H: TransactionHost> {
    host: &'a H,
}

impl<'a, H: TransactionHost> ResilientTransaction<'a, H> {
    pub fn new(host: &'a H) -> Self {
        Self { host }
    }

    /// Execute `action` transactionally.
    ///
    /// If a transaction is already active the action runs directly and no
    /// nested transaction is opened. Otherwise the whole
    /// begin-action-commit unit runs under the host's retry policy, so a
    /// transient failure reruns the action in a fresh transaction.
    pub async fn execute<T, F, Fut>(&self, action: F) -> StoreResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        if self.host.in_transaction() {
            return action().await;
        }
        self.host
            .retry_strategy()
            .execute(|| async {
                self.host.begin().await?;
                match action().await {
                    Ok(value) => {
                        self.host.commit().await?;
                        Ok(value)
                    }
                    Err(err) => {
                        if let Err(rollback_err) = self.host.rollback().await {
                            warn!(error = %rollback_err, "rollback failed");
                        }
                        Err(err)
                    }
                }
            })
            .await
    }
}
