//! Read pipeline and write-commit plumbing shared by both service surfaces.

use std::sync::Arc;

use serde::Serialize;
use strata_cache::CacheService;
use strata_core::{FieldValue, Pageable, ProjectFrom, Record, SchemaError, ServiceResult};
use strata_data::{newest_first, project_all, EntityStore, GenericRepository, ListQuery};
use tracing::info;

use crate::roles::{CacheMode, ServiceOptions, ServiceRoles};

pub(crate) const LIST_OP: &str = "List";
pub(crate) const SEARCH_OP: &str = "Search";
pub(crate) const GET_OP: &str = "Get";
pub(crate) const COUNT_OP: &str = "Count";

/// Request fields that never affect a count.
const COUNT_EXCLUDED: &[&str] = &["pageIndex", "pageSize"];

/// Serialize a request into deterministic `name=value` cache-key parts.
///
/// Null fields are dropped, so an absent optional and an omitted one key
/// identically.
pub(crate) fn request_parts<Req: Serialize>(request: &Req, exclude: &[&str]) -> Vec<String> {
    match serde_json::to_value(request) {
        Ok(serde_json::Value::Object(map)) => map
            .iter()
            .filter(|(name, _)| !exclude.contains(&name.as_str()))
            .filter(|(_, value)| !value.is_null())
            .map(|(name, value)| match value {
                serde_json::Value::String(text) => format!("{name}={text}"),
                other => format!("{name}={other}"),
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Identity values joined into one cache-key part.
pub(crate) fn join_values(values: &[FieldValue]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("_")
}

/// Apply an untyped field/value bag to an entity through its schema.
///
/// Names resolve storage-column first with pascal-case fallback; unknown
/// and read-only fields are skipped; values coerce to the target field's
/// declared kind, and a coercion failure fails the whole patch.
pub(crate) fn apply_patch<E: Record>(
    entity: &mut E,
    input: &[(String, serde_json::Value)],
) -> Result<(), SchemaError> {
    let schema = E::schema();
    for (name, value) in input {
        schema.set_field(entity, name, FieldValue::from_json(value))?;
    }
    Ok(())
}

/// Repository, cache, and options behind one entity-type surface.
pub(crate) struct ServiceBase<R: ServiceRoles, S: EntityStore<R::Entity>> {
    pub(crate) repository: GenericRepository<R::Entity, S>,
    pub(crate) cache: Arc<CacheService>,
    pub(crate) options: ServiceOptions<R>,
}

impl<R: ServiceRoles, S: EntityStore<R::Entity>> ServiceBase<R, S> {
    pub(crate) fn new(
        store: Arc<S>,
        cache: Arc<CacheService>,
        options: ServiceOptions<R>,
    ) -> Self {
        Self {
            repository: GenericRepository::new(store),
            cache,
            options,
        }
    }

    pub(crate) fn scope(&self) -> &'static str {
        R::Entity::type_name()
    }

    pub(crate) fn cache_key(&self, op: &str, extra: &[String]) -> Vec<String> {
        let mut parts = Vec::with_capacity(extra.len() + 2);
        parts.push(self.scope().to_string());
        parts.push(op.to_string());
        parts.extend_from_slice(extra);
        parts
    }

    /// The paged read pipeline, cache-wrapped, projected to `P`.
    pub(crate) async fn list_projected<P>(
        &self,
        op: &str,
        shape: Option<&'static str>,
        request: &R::Request,
    ) -> ServiceResult<Vec<P>>
    where
        P: ProjectFrom<R::Entity> + Clone + Send + Sync + 'static,
    {
        let mut extra: Vec<String> = shape.map(str::to_string).into_iter().collect();
        extra.extend(request_parts(request, &[]));
        let key = self.cache_key(op, &extra);
        self.cache
            .get_or_create_if(self.options.cache_mode.caches_reads(), &key, || async move {
                let rows = self.repository.list_all().await?;
                let query =
                    ListQuery::new(request.page()).filtered((self.options.filter)(request));
                Ok(project_all::<_, P>(&query.run(rows)?))
            })
            .await
    }

    /// Every row, newest first, projected to `P`.
    pub(crate) async fn list_all_projected<P>(
        &self,
        shape: Option<&'static str>,
    ) -> ServiceResult<Vec<P>>
    where
        P: ProjectFrom<R::Entity> + Clone + Send + Sync + 'static,
    {
        let extra: Vec<String> = shape.map(str::to_string).into_iter().collect();
        let key = self.cache_key(LIST_OP, &extra);
        self.cache
            .get_or_create_if(self.options.cache_mode.caches_reads(), &key, || async move {
                let mut rows = self.repository.list_all().await?;
                newest_first(&mut rows);
                Ok(project_all::<_, P>(&rows))
            })
            .await
    }

    pub(crate) async fn count(&self) -> ServiceResult<u64> {
        let key = self.cache_key(COUNT_OP, &[]);
        self.cache
            .get_or_create_if(self.options.cache_mode.caches_counts(), &key, || async move {
                Ok(self.repository.count().await?)
            })
            .await
    }

    /// Count under filter and date range. Paging fields are excluded from
    /// the cache key, so every page of one search shares a count entry.
    pub(crate) async fn count_filtered(&self, request: &R::Request) -> ServiceResult<u64> {
        let extra = request_parts(request, COUNT_EXCLUDED);
        let key = self.cache_key(COUNT_OP, &extra);
        self.cache
            .get_or_create_if(self.options.cache_mode.caches_counts(), &key, || async move {
                let rows = self.repository.list_all().await?;
                let query =
                    ListQuery::new(request.page()).filtered((self.options.filter)(request));
                Ok(query.count(rows) as u64)
            })
            .await
    }

    /// Single-entity read by positional identity values, cache-wrapped
    /// under the Get scope.
    pub(crate) async fn get_projected<P>(
        &self,
        keys: Vec<FieldValue>,
        shape: Option<&'static str>,
    ) -> ServiceResult<Option<P>>
    where
        P: ProjectFrom<R::Entity> + Clone + Send + Sync + 'static,
    {
        let mut extra = vec![join_values(&keys)];
        extra.extend(shape.map(str::to_string));
        let key = self.cache_key(GET_OP, &extra);
        self.cache
            .get_or_create_if(self.options.cache_mode.caches_reads(), &key, || async move {
                Ok(self
                    .repository
                    .get(&keys)
                    .await?
                    .map(|entity| P::project_from(&entity)))
            })
            .await
    }

    /// Single-entity read by a resolved name→value filter map,
    /// cache-wrapped under the Get scope.
    pub(crate) async fn find_projected<P>(
        &self,
        pairs: Vec<(String, FieldValue)>,
        shape: Option<&'static str>,
    ) -> ServiceResult<Option<P>>
    where
        P: ProjectFrom<R::Entity> + Clone + Send + Sync + 'static,
    {
        let values: Vec<FieldValue> = pairs.iter().map(|(_, value)| value.clone()).collect();
        let mut extra = vec![join_values(&values)];
        extra.extend(shape.map(str::to_string));
        let key = self.cache_key(GET_OP, &extra);
        self.cache
            .get_or_create_if(self.options.cache_mode.caches_reads(), &key, || async move {
                Ok(self
                    .repository
                    .find_by_map(&pairs)
                    .await?
                    .map(|entity| P::project_from(&entity)))
            })
            .await
    }

    /// Commit staged writes and invalidate per the cache mode.
    pub(crate) async fn save_changes(&self) -> ServiceResult<usize> {
        let affected = self.repository.save_changes().await?;
        if affected > 0 {
            match self.options.cache_mode {
                CacheMode::Full => {
                    self.cache.remove(&[self.scope().to_string()]);
                    for scope in &self.options.related_scopes {
                        self.cache.remove(&[scope.to_string()]);
                    }
                }
                CacheMode::CountOnly => {
                    self.cache.remove(&self.cache_key(COUNT_OP, &[]));
                }
                CacheMode::Disabled => {}
            }
            info!(entity = self.scope(), affected, "write committed");
        }
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::*;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Shape {
        sorting: Option<String>,
        page_index: u16,
        page_size: u16,
    }

    #[test]
    fn request_parts_are_deterministic_name_value_pairs() {
        let shape = Shape {
            sorting: Some("Id desc".into()),
            page_index: 2,
            page_size: 50,
        };
        let parts = request_parts(&shape, &[]);
        assert_eq!(parts, vec!["pageIndex=2", "pageSize=50", "sorting=Id desc"]);
    }

    #[test]
    fn request_parts_drop_nulls_and_exclusions() {
        let shape = Shape {
            sorting: None,
            page_index: 1,
            page_size: 1000,
        };
        let parts = request_parts(&shape, &["pageIndex", "pageSize"]);
        assert!(parts.is_empty());
    }
}
