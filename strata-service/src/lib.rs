//! STRATA Service - Generic CRUD Orchestration
//!
//! One service instance realizes List/Search/Get/Count/Create/Update/
//! Patch/Delete for an entity type, configured entirely by a role set (the
//! cooperating shapes) and a [`ServiceOptions`] value (hooks and cache
//! policy). [`GenericService`] addresses entities by a single key;
//! [`MultiKeyGenericService`] addresses composite identities through
//! name→value queries.
//!
//! Reads are cache-wrapped through `strata-cache` under composite keys of
//! `{type, operation, [shape], request fields}`; successful writes
//! invalidate the entity's whole cache scope (or just its count scope in
//! count-only mode) plus any declared related scopes.

mod base;
pub mod generic;
pub mod multi_key;
pub mod roles;

pub use generic::GenericService;
pub use multi_key::MultiKeyGenericService;
pub use roles::{CacheMode, KeyedRoles, ServiceOptions, ServiceRoles};

use strata_core::{ApiResponse, ServiceError, ServiceResult};
use uuid::Uuid;

/// Translate a service outcome into the response envelope contract.
///
/// Deliberate signals map 1:1 to status codes. Anything else is logged
/// under a generated correlation id and rendered as a generic failure that
/// exposes only that id; debug builds keep the error text.
pub fn into_response<T>(result: ServiceResult<T>) -> ApiResponse<T> {
    match result {
        Ok(data) => ApiResponse::ok(data),
        Err(ServiceError::BadRequest(message)) => ApiResponse::bad_request(message),
        Err(ServiceError::NotFound(message)) => ApiResponse::not_found(message),
        Err(ServiceError::Conflict(message)) => ApiResponse::conflict(message),
        Err(err) => {
            let correlation = Uuid::now_v7();
            tracing::error!(%correlation, error = %err, "unhandled service failure");
            if cfg!(debug_assertions) {
                ApiResponse::fail(500, format!("{err} (ref {correlation})"))
            } else {
                ApiResponse::internal_error(correlation)
            }
        }
    }
}
