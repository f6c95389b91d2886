//! The composite-key CRUD surface.
//!
//! Identity here is the schema's ordered key-field set, addressed through
//! arbitrary name→value queries. Query names resolve against the schema and
//! are silently dropped unless they belong to the declared identity, so a
//! raw query string can be passed through unfiltered.

use std::sync::Arc;

use strata_cache::CacheService;
use strata_core::{
    short_type_name, AuditedRecord, FieldValue, IntoRecord, MergeInto, ProjectFrom, Record,
    ServiceError, ServiceResult,
};
use strata_data::{identity_from_query, EntityStore};
use tracing::debug;

use crate::base::{apply_patch, join_values, ServiceBase, LIST_OP, SEARCH_OP};
use crate::roles::{ServiceOptions, ServiceRoles};

pub struct MultiKeyGenericService<R: ServiceRoles, S: EntityStore<R::Entity>> {
    base: ServiceBase<R, S>,
}

impl<R: ServiceRoles, S: EntityStore<R::Entity>> MultiKeyGenericService<R, S> {
    pub fn new(store: Arc<S>, cache: Arc<CacheService>, options: ServiceOptions<R>) -> Self {
        Self {
            base: ServiceBase::new(store, cache, options),
        }
    }

    pub async fn list(&self, request: &R::Request) -> ServiceResult<Vec<R::List>> {
        self.base.list_projected(LIST_OP, None, request).await
    }

    pub async fn list_as<P>(&self, request: &R::Request) -> ServiceResult<Vec<P>>
    where
        P: ProjectFrom<R::Entity> + Clone + Send + Sync + 'static,
    {
        self.base
            .list_projected(LIST_OP, Some(short_type_name::<P>()), request)
            .await
    }

    pub async fn search(&self, request: &R::Request) -> ServiceResult<Vec<R::List>> {
        self.base.list_projected(SEARCH_OP, None, request).await
    }

    pub async fn search_as<P>(&self, request: &R::Request) -> ServiceResult<Vec<P>>
    where
        P: ProjectFrom<R::Entity> + Clone + Send + Sync + 'static,
    {
        self.base
            .list_projected(SEARCH_OP, Some(short_type_name::<P>()), request)
            .await
    }

    pub async fn list_all(&self) -> ServiceResult<Vec<R::List>> {
        self.base.list_all_projected(None).await
    }

    pub async fn count(&self) -> ServiceResult<u64> {
        self.base.count().await
    }

    pub async fn count_filtered(&self, request: &R::Request) -> ServiceResult<u64> {
        self.base.count_filtered(request).await
    }

    /// Load one entity by a name→value query, projected to the detail
    /// shape.
    pub async fn find(&self, query: &[(String, String)]) -> ServiceResult<Option<R::Detail>> {
        let pairs = self.identity_pairs(query)?;
        self.base.find_projected(pairs, None).await
    }

    pub async fn find_as<P>(&self, query: &[(String, String)]) -> ServiceResult<Option<P>>
    where
        P: ProjectFrom<R::Entity> + Clone + Send + Sync + 'static,
    {
        let pairs = self.identity_pairs(query)?;
        self.base
            .find_projected(pairs, Some(short_type_name::<P>()))
            .await
    }

    /// Validate, check for an identity collision, map, stamp, stage, and
    /// commit a new entity.
    pub async fn create(&self, input: R::Create) -> ServiceResult<bool> {
        if !(self.base.options.validate_create)(&input) {
            return Err(ServiceError::bad_request());
        }
        let mut entity = input.into_record();
        let keys = R::Entity::schema().identity_values(&entity);
        if self.base.repository.exists(&keys).await? {
            return Err(ServiceError::Conflict(format!(
                "Identity already exists: {}",
                join_values(&keys)
            )));
        }
        entity.stamp_created((self.base.options.current_actor)());
        (self.base.options.extend_create)(&mut entity);
        self.base.repository.add(entity).await?;
        Ok(self.base.save_changes().await? > 0)
    }

    pub async fn update(
        &self,
        query: &[(String, String)],
        input: R::Update,
    ) -> ServiceResult<bool> {
        if !(self.base.options.validate_update)(&input) {
            return Err(ServiceError::bad_request());
        }
        let mut entity = self.load(query).await?;
        input.merge_into(&mut entity);
        entity.stamp_updated((self.base.options.current_actor)());
        self.base.repository.update(entity).await?;
        Ok(self.base.save_changes().await? > 0)
    }

    pub async fn patch(
        &self,
        query: &[(String, String)],
        input: &[(String, serde_json::Value)],
    ) -> ServiceResult<bool> {
        let mut entity = self.load(query).await?;
        apply_patch(&mut entity, input)?;
        entity.stamp_updated((self.base.options.current_actor)());
        self.base.repository.update(entity).await?;
        Ok(self.base.save_changes().await? > 0)
    }

    pub async fn delete(&self, query: &[(String, String)]) -> ServiceResult<bool> {
        let entity = self.load(query).await?;
        self.base.repository.remove(&entity).await?;
        Ok(self.base.save_changes().await? > 0)
    }

    /// Resolve a query to identity filter pairs. A query naming no
    /// identity field at all would match arbitrary rows, so it is rejected
    /// outright.
    fn identity_pairs(
        &self,
        query: &[(String, String)],
    ) -> ServiceResult<Vec<(String, FieldValue)>> {
        let pairs = identity_from_query::<R::Entity>(query)?;
        if pairs.is_empty() {
            return Err(ServiceError::BadRequest(
                "Query names no identity field".to_string(),
            ));
        }
        Ok(pairs)
    }

    async fn load(&self, query: &[(String, String)]) -> ServiceResult<R::Entity> {
        let pairs = self.identity_pairs(query)?;
        match self.base.repository.find_by_map(&pairs).await? {
            Some(entity) => Ok(entity),
            None => {
                debug!(entity = self.base.scope(), "identity not found");
                Err(ServiceError::not_found())
            }
        }
    }
}
