//! Per-entity data access over an [`EntityStore`].
//!
//! The repository turns identity tuples and name→value filter maps into
//! predicates and evaluates them against store snapshots. It stages writes;
//! committing is the caller's `save_changes` call, so several staged
//! operations can share one commit.

use std::marker::PhantomData;
use std::sync::Arc;

use strata_core::{FieldValue, Record, ServiceResult, StoreResult};

use crate::predicate::{self, Predicate};
use crate::store::EntityStore;

pub struct GenericRepository<E: Record, S: EntityStore<E>> {
    store: Arc<S>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Record, S: EntityStore<E>> Clone for GenericRepository<E, S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _entity: PhantomData,
        }
    }
}

impl<E: Record, S: EntityStore<E>> GenericRepository<E, S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Load by positional identity values.
    pub async fn get(&self, keys: &[FieldValue]) -> ServiceResult<Option<E>> {
        let matches = predicate::identity::<E>(keys)?;
        Ok(self.find(&matches).await?)
    }

    /// First row matching the predicate.
    pub async fn find(&self, matches: &Predicate<E>) -> StoreResult<Option<E>> {
        Ok(self
            .store
            .scan()
            .await?
            .into_iter()
            .find(|row| matches(row)))
    }

    /// First row matching a name→value filter map.
    pub async fn find_by_map(&self, pairs: &[(String, FieldValue)]) -> ServiceResult<Option<E>> {
        let matches = predicate::equality::<E>(pairs)?;
        Ok(self.find(&matches).await?)
    }

    pub async fn list_all(&self) -> StoreResult<Vec<E>> {
        self.store.scan().await
    }

    pub async fn list(
        &self,
        matches: &Predicate<E>,
        skip: usize,
        take: usize,
    ) -> StoreResult<Vec<E>> {
        Ok(self
            .store
            .scan()
            .await?
            .into_iter()
            .filter(|row| matches(row))
            .skip(skip)
            .take(take)
            .collect())
    }

    pub async fn count(&self) -> StoreResult<u64> {
        Ok(self.store.scan().await?.len() as u64)
    }

    pub async fn count_where(&self, matches: &Predicate<E>) -> StoreResult<u64> {
        Ok(self
            .store
            .scan()
            .await?
            .iter()
            .filter(|row| matches(row))
            .count() as u64)
    }

    pub async fn exists(&self, keys: &[FieldValue]) -> ServiceResult<bool> {
        Ok(self.get(keys).await?.is_some())
    }

    pub async fn exists_by_map(&self, pairs: &[(String, FieldValue)]) -> ServiceResult<bool> {
        Ok(self.find_by_map(pairs).await?.is_some())
    }

    pub async fn add(&self, entity: E) -> StoreResult<()> {
        self.store.add(entity).await
    }

    pub async fn update(&self, entity: E) -> StoreResult<()> {
        self.store.update(entity).await
    }

    pub async fn remove(&self, entity: &E) -> StoreResult<()> {
        self.store.remove(entity).await
    }

    pub async fn save_changes(&self) -> StoreResult<usize> {
        self.store.save_changes().await
    }

    /// Delete by identity values, committing immediately. Returns the
    /// affected-row count; a missing identity deletes nothing.
    pub async fn delete(&self, keys: &[FieldValue]) -> ServiceResult<usize> {
        match self.get(keys).await? {
            Some(entity) => {
                self.remove(&entity).await?;
                Ok(self.save_changes().await?)
            }
            None => Ok(0),
        }
    }
}
