//! STRATA Core - Entity Metadata and Shared Types
//!
//! Pure data types and per-type metadata for the strata data-access toolkit.
//! All other crates depend on this. This crate contains no I/O: the field
//! schemas defined here are plain registries of accessor functions, built
//! once per entity type and evaluated as closures thereafter.

pub mod convert;
pub mod error;
pub mod record;
pub mod request;
pub mod response;
pub mod schema;
pub mod value;

pub use convert::{IntoRecord, MergeInto, ProjectFrom};
pub use error::{SchemaError, ServiceError, ServiceResult, StoreError, StoreResult};
pub use record::{AuditedRecord, KeyedRecord, Record, Timestamp};
pub use request::{PageRequest, Pageable, MAX_PAGE_SIZE};
pub use response::ApiResponse;
pub use schema::{pascal_case, EntitySchema, FieldDef, Getter, SchemaBuilder, Setter};
pub use value::{FieldKind, FieldValue};

/// Last path segment of a type name, e.g. `OrderSummary` for
/// `my_app::dto::OrderSummary`. Used for cache-key parts that name an
/// output shape.
pub fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
