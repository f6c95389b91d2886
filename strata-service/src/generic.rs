//! The single-key CRUD surface.

use std::sync::Arc;

use strata_cache::CacheService;
use strata_core::{
    short_type_name, AuditedRecord, FieldValue, IntoRecord, MergeInto, ProjectFrom, ServiceError,
    ServiceResult,
};
use strata_data::EntityStore;
use tracing::debug;

use crate::base::{apply_patch, ServiceBase, LIST_OP, SEARCH_OP};
use crate::roles::{KeyedRoles, ServiceOptions};

/// CRUD orchestration for an entity addressed by a single identity value.
///
/// Reads run through the cache according to the configured
/// [`CacheMode`](crate::roles::CacheMode); every successful write
/// invalidates the entity's cache scope before reporting success.
pub struct GenericService<R: KeyedRoles, S: EntityStore<R::Entity>> {
    base: ServiceBase<R, S>,
}

impl<R: KeyedRoles, S: EntityStore<R::Entity>> GenericService<R, S> {
    pub fn new(store: Arc<S>, cache: Arc<CacheService>, options: ServiceOptions<R>) -> Self {
        Self {
            base: ServiceBase::new(store, cache, options),
        }
    }

    /// Paged, filtered, ordered read projected to the list shape.
    pub async fn list(&self, request: &R::Request) -> ServiceResult<Vec<R::List>> {
        self.base.list_projected(LIST_OP, None, request).await
    }

    /// `list` projected to an arbitrary output shape.
    pub async fn list_as<P>(&self, request: &R::Request) -> ServiceResult<Vec<P>>
    where
        P: ProjectFrom<R::Entity> + Clone + Send + Sync + 'static,
    {
        self.base
            .list_projected(LIST_OP, Some(short_type_name::<P>()), request)
            .await
    }

    /// Same pipeline as `list`, cached under its own operation scope so
    /// lookup-style queries can be invalidated separately.
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

    /// Every entity, newest first.
    pub async fn list_all(&self) -> ServiceResult<Vec<R::List>> {
        self.base.list_all_projected(None).await
    }

    pub async fn list_all_as<P>(&self) -> ServiceResult<Vec<P>>
    where
        P: ProjectFrom<R::Entity> + Clone + Send + Sync + 'static,
    {
        self.base
            .list_all_projected(Some(short_type_name::<P>()))
            .await
    }

    pub async fn count(&self) -> ServiceResult<u64> {
        self.base.count().await
    }

    pub async fn count_filtered(&self, request: &R::Request) -> ServiceResult<u64> {
        self.base.count_filtered(request).await
    }

    /// Load one entity by key, projected to the detail shape. A missing
    /// identity is `None`; translating that to a not-found response is the
    /// consuming layer's concern.
    pub async fn get(&self, id: R::Key) -> ServiceResult<Option<R::Detail>> {
        self.base.get_projected(vec![id.into()], None).await
    }

    pub async fn get_as<P>(&self, id: R::Key) -> ServiceResult<Option<P>>
    where
        P: ProjectFrom<R::Entity> + Clone + Send + Sync + 'static,
    {
        self.base
            .get_projected(vec![id.into()], Some(short_type_name::<P>()))
            .await
    }

    /// Validate, map, stamp, stage, and commit a new entity.
    pub async fn create(&self, input: R::Create) -> ServiceResult<bool> {
        if !(self.base.options.validate_create)(&input) {
            return Err(ServiceError::bad_request());
        }
        let mut entity = input.into_record();
        entity.stamp_created((self.base.options.current_actor)());
        (self.base.options.extend_create)(&mut entity);
        self.base.repository.add(entity).await?;
        Ok(self.base.save_changes().await? > 0)
    }

    /// Merge the update input onto the loaded entity and commit.
    pub async fn update(&self, id: R::Key, input: R::Update) -> ServiceResult<bool> {
        if !(self.base.options.validate_update)(&input) {
            return Err(ServiceError::bad_request());
        }
        let mut entity = self.load(id).await?;
        input.merge_into(&mut entity);
        entity.stamp_updated((self.base.options.current_actor)());
        self.base.repository.update(entity).await?;
        Ok(self.base.save_changes().await? > 0)
    }

    /// Apply an untyped field/value bag and commit. Field names resolve
    /// through the schema; values coerce to each field's declared kind.
    pub async fn patch(
        &self,
        id: R::Key,
        input: &[(String, serde_json::Value)],
    ) -> ServiceResult<bool> {
        let mut entity = self.load(id).await?;
        apply_patch(&mut entity, input)?;
        entity.stamp_updated((self.base.options.current_actor)());
        self.base.repository.update(entity).await?;
        Ok(self.base.save_changes().await? > 0)
    }

    pub async fn delete(&self, id: R::Key) -> ServiceResult<bool> {
        let entity = self.load(id).await?;
        self.base.repository.remove(&entity).await?;
        Ok(self.base.save_changes().await? > 0)
    }

    async fn load(&self, id: R::Key) -> ServiceResult<R::Entity> {
        let key: FieldValue = id.into();
        match self.base.repository.get(&[key.clone()]).await? {
            Some(entity) => Ok(entity),
            None => {
                debug!(entity = self.base.scope(), key = %key, "identity not found");
                Err(ServiceError::not_found())
            }
        }
    }
}
