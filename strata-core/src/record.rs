//! Entity traits.
//!
//! A [`Record`] is any type with a field schema. [`AuditedRecord`] adds the
//! creation/update timestamp and actor fields the read pipeline and write
//! paths rely on. [`KeyedRecord`] is the single-key convenience used by the
//! keyed service surface; composite-key entities declare their identity in
//! the schema only.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::schema::EntitySchema;
use crate::value::FieldValue;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// An entity type with a registered field schema.
pub trait Record: Clone + Send + Sync + 'static {
    /// The per-type field registry, built once.
    fn schema() -> &'static EntitySchema<Self>;

    /// Logical type name; first part of every cache key for this type.
    fn type_name() -> &'static str {
        Self::schema().type_name()
    }
}

/// An entity carrying audit fields. Identity fields are immutable after
/// creation; audit fields are written only through the stamp methods.
pub trait AuditedRecord: Record {
    fn created_at(&self) -> Timestamp;
    fn created_by(&self) -> Uuid;
    fn updated_at(&self) -> Option<Timestamp>;
    fn updated_by(&self) -> Option<Uuid>;

    /// Stamp creation time and actor. `None` records the nil actor.
    fn stamp_created(&mut self, actor: Option<Uuid>);

    /// Stamp update time and actor.
    fn stamp_updated(&mut self, actor: Option<Uuid>);
}

/// An entity with a single identity field.
pub trait KeyedRecord: Record {
    type Key: Clone + Into<FieldValue> + Send + Sync + 'static;

    fn key(&self) -> Self::Key;
}
