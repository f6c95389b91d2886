//! Role-set configuration for the generic services.
//!
//! One [`ServiceRoles`] implementation names every shape a service
//! cooperates with; [`ServiceOptions`] carries the per-type hooks and cache
//! policy. Together they configure a service entirely by composition: a new
//! entity type needs one small roles struct and an options value, no
//! subclassing.

use std::sync::Arc;

use serde::Serialize;
use strata_core::{AuditedRecord, FieldValue, IntoRecord, MergeInto, Pageable, ProjectFrom};
use strata_data::{always, Predicate};
use uuid::Uuid;

/// The cooperating shapes of one generic service.
pub trait ServiceRoles: Send + Sync + 'static {
    /// The persisted entity.
    type Entity: AuditedRecord;
    /// The filter/request shape consumed by list, search, and count.
    type Request: Pageable + Serialize + Send + Sync;
    /// The projection returned by list and search.
    type List: ProjectFrom<Self::Entity> + Clone + Send + Sync + 'static;
    /// The projection returned by single-entity reads.
    type Detail: ProjectFrom<Self::Entity> + Clone + Send + Sync + 'static;
    /// The create input.
    type Create: IntoRecord<Self::Entity> + Send + Sync;
    /// The update input.
    type Update: MergeInto<Self::Entity> + Send + Sync;
}

/// Roles whose entity is addressed by a single identity value.
///
/// Composite-key entities skip this trait; their service addresses rows
/// through name→value queries resolved against the schema's identity.
pub trait KeyedRoles: ServiceRoles {
    type Key: Clone + Into<FieldValue> + Send + Sync;
}

/// Which reads of an entity type are cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    /// Nothing cached; writes invalidate nothing.
    Disabled,
    /// Only counts are cached; writes invalidate only the count scope.
    CountOnly,
    /// Every read cached; writes invalidate the whole entity scope.
    Full,
}

impl CacheMode {
    pub(crate) fn caches_reads(self) -> bool {
        matches!(self, CacheMode::Full)
    }

    pub(crate) fn caches_counts(self) -> bool {
        !matches!(self, CacheMode::Disabled)
    }
}

/// Per-type hooks and cache policy.
///
/// Every hook has an accept/no-op default, so `ServiceOptions::default()`
/// yields a service with plain CRUD semantics.
pub struct ServiceOptions<R: ServiceRoles> {
    pub cache_mode: CacheMode,
    /// Cache scopes of related entity types, invalidated together with this
    /// type's scope after a successful write.
    pub related_scopes: Vec<&'static str>,
    /// Gate on create; rejection surfaces as a bad request.
    pub validate_create: Arc<dyn Fn(&R::Create) -> bool + Send + Sync>,
    /// Gate on update; rejection surfaces as a bad request.
    pub validate_update: Arc<dyn Fn(&R::Update) -> bool + Send + Sync>,
    /// Runs on the mapped entity after create mapping, before staging.
    pub extend_create: Arc<dyn Fn(&mut R::Entity) + Send + Sync>,
    /// Entity-specific filter applied at the head of the read pipeline.
    pub filter: Arc<dyn Fn(&R::Request) -> Predicate<R::Entity> + Send + Sync>,
    /// Supplies the acting user for audit stamping.
    pub current_actor: Arc<dyn Fn() -> Option<Uuid> + Send + Sync>,
}

impl<R: ServiceRoles> Default for ServiceOptions<R> {
    fn default() -> Self {
        Self {
            cache_mode: CacheMode::Disabled,
            related_scopes: Vec::new(),
            validate_create: Arc::new(|_| true),
            validate_update: Arc::new(|_| true),
            extend_create: Arc::new(|_| {}),
            filter: Arc::new(|_| always()),
            current_actor: Arc::new(|| None),
        }
    }
}

impl<R: ServiceRoles> ServiceOptions<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache_mode(mut self, mode: CacheMode) -> Self {
        self.cache_mode = mode;
        self
    }

    /// Invalidate another entity type's cache scope on every write of this
    /// one.
    pub fn with_related_scope(mut self, scope: &'static str) -> Self {
        self.related_scopes.push(scope);
        self
    }

    pub fn with_validate_create(
        mut self,
        hook: impl Fn(&R::Create) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.validate_create = Arc::new(hook);
        self
    }

    pub fn with_validate_update(
        mut self,
        hook: impl Fn(&R::Update) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.validate_update = Arc::new(hook);
        self
    }

    pub fn with_extend_create(
        mut self,
        hook: impl Fn(&mut R::Entity) + Send + Sync + 'static,
    ) -> Self {
        self.extend_create = Arc::new(hook);
        self
    }

    pub fn with_filter(
        mut self,
        hook: impl Fn(&R::Request) -> Predicate<R::Entity> + Send + Sync + 'static,
    ) -> Self {
        self.filter = Arc::new(hook);
        self
    }

    pub fn with_current_actor(
        mut self,
        hook: impl Fn() -> Option<Uuid> + Send + Sync + 'static,
    ) -> Self {
        self.current_actor = Arc::new(hook);
        self
    }
}
