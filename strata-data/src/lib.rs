//! STRATA Data - Generic Data Access
//!
//! Everything between an entity schema and a persisted row: predicate and
//! sort construction over runtime field names, the read pipeline
//! (filter, date range, order, page, project), the persistence-collaborator
//! traits with an in-memory reference store, the per-entity repository, and
//! the retry-aware transaction wrapper.

pub mod predicate;
pub mod query;
pub mod repository;
pub mod sort;
pub mod store;
pub mod transaction;

pub use predicate::{always, equality, identity, identity_from_query, never, Predicate};
pub use query::{newest_first, project_all, ListQuery};
pub use repository::GenericRepository;
pub use sort::{normalize_spec, SortDirection, SortPlan};
pub use store::{EntityStore, InMemoryStore};
pub use transaction::{ResilientTransaction, RetryStrategy, TransactionHost};

#[cfg(test)]
pub(crate) mod testing {
    use chrono::{Duration, TimeZone, Utc};
    use once_cell::sync::Lazy;
    use strata_core::{
        AuditedRecord, EntitySchema, FieldKind, FieldValue, KeyedRecord, Record, Timestamp,
    };
    use uuid::Uuid;

    #[derive(Debug, Clone, PartialEq)]
    pub struct Ticket {
        pub id: i64,
        pub title: String,
        pub priority: i32,
        pub created_at: Timestamp,
        pub created_by: Uuid,
        pub updated_at: Option<Timestamp>,
        pub updated_by: Option<Uuid>,
    }

    static TICKET_SCHEMA: Lazy<EntitySchema<Ticket>> = Lazy::new(|| {
        EntitySchema::builder("Ticket")
            .field("Id", FieldKind::I64, |t: &Ticket| t.id.into())
            .writable(
                "Title",
                FieldKind::Text,
                |t: &Ticket| t.title.clone().into(),
                |t, v| match v {
                    FieldValue::Text(s) => {
                        t.title = s;
                        true
                    }
                    _ => false,
                },
            )
            .writable(
                "Priority",
                FieldKind::I32,
                |t: &Ticket| t.priority.into(),
                |t, v| match v {
                    FieldValue::I32(n) => {
                        t.priority = n;
                        true
                    }
                    _ => false,
                },
            )
            .field("CreatedDate", FieldKind::DateTime, |t: &Ticket| {
                t.created_at.into()
            })
            .identity(&["Id"])
            .build()
    });

    impl Record for Ticket {
        fn schema() -> &'static EntitySchema<Self> {
            &TICKET_SCHEMA
        }
    }

    impl AuditedRecord for Ticket {
        fn created_at(&self) -> Timestamp {
            self.created_at
        }

        fn created_by(&self) -> Uuid {
            self.created_by
        }

        fn updated_at(&self) -> Option<Timestamp> {
            self.updated_at
        }

        fn updated_by(&self) -> Option<Uuid> {
            self.updated_by
        }

        fn stamp_created(&mut self, actor: Option<Uuid>) {
            self.created_at = Utc::now();
            self.created_by = actor.unwrap_or(Uuid::nil());
        }

        fn stamp_updated(&mut self, actor: Option<Uuid>) {
            self.updated_at = Some(Utc::now());
            self.updated_by = Some(actor.unwrap_or(Uuid::nil()));
        }
    }

    impl KeyedRecord for Ticket {
        type Key = i64;

        fn key(&self) -> i64 {
            self.id
        }
    }

    /// Ticket with a creation time `minutes` after a fixed epoch, so tests
    /// get deterministic newest-first ordering.
    pub fn ticket(id: i64, title: &str, priority: i32, minutes: i64) -> Ticket {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Ticket {
            id,
            title: title.to_string(),
            priority,
            created_at: base + Duration::minutes(minutes),
            created_by: Uuid::nil(),
            updated_at: None,
            updated_by: None,
        }
    }
}
