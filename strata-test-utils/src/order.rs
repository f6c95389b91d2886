//! Single-key sample entity with its projection and input shapes.

use std::sync::Arc;

use chrono::Utc;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use strata_core::{
    AuditedRecord, EntitySchema, FieldKind, FieldValue, IntoRecord, KeyedRecord, MergeInto,
    ProjectFrom, Record, Timestamp,
};
use strata_data::InMemoryStore;
use uuid::Uuid;

use crate::minted_at;

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: i64,
    pub number: String,
    pub customer: String,
    pub total: Decimal,
    pub status: i32,
    pub created_at: Timestamp,
    pub created_by: Uuid,
    pub updated_at: Option<Timestamp>,
    pub updated_by: Option<Uuid>,
}

static ORDER_SCHEMA: Lazy<EntitySchema<Order>> = Lazy::new(|| {
    EntitySchema::builder("Order")
        .field("Id", FieldKind::I64, |o: &Order| o.id.into())
        .column("id")
        .writable(
            "OrderNumber",
            FieldKind::Text,
            |o: &Order| o.number.clone().into(),
            |o, v| match v {
                FieldValue::Text(s) => {
                    o.number = s;
                    true
                }
                _ => false,
            },
        )
        .column("order_number")
        .writable(
            "CustomerName",
            FieldKind::Text,
            |o: &Order| o.customer.clone().into(),
            |o, v| match v {
                FieldValue::Text(s) => {
                    o.customer = s;
                    true
                }
                _ => false,
            },
        )
        .column("customer_name")
        .writable(
            "Total",
            FieldKind::Decimal,
            |o: &Order| o.total.into(),
            |o, v| match v {
                FieldValue::Decimal(d) => {
                    o.total = d;
                    true
                }
                _ => false,
            },
        )
        .writable(
            "Status",
            FieldKind::I32,
            |o: &Order| o.status.into(),
            |o, v| match v {
                FieldValue::I32(n) => {
                    o.status = n;
                    true
                }
                _ => false,
            },
        )
        .field("CreatedDate", FieldKind::DateTime, |o: &Order| {
            o.created_at.into()
        })
        .column("created_date")
        .identity(&["Id"])
        .build()
});

impl Record for Order {
    fn schema() -> &'static EntitySchema<Self> {
        &ORDER_SCHEMA
    }
}

impl AuditedRecord for Order {
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

impl KeyedRecord for Order {
    type Key = i64;

    fn key(&self) -> i64 {
        self.id
    }
}

/// List projection.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSummary {
    pub id: i64,
    pub number: String,
    pub total: Decimal,
}

impl ProjectFrom<Order> for OrderSummary {
    fn project_from(order: &Order) -> Self {
        Self {
            id: order.id,
            number: order.number.clone(),
            total: order.total,
        }
    }
}

/// Detail projection.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDetail {
    pub id: i64,
    pub number: String,
    pub customer: String,
    pub total: Decimal,
    pub status: i32,
    pub created_at: Timestamp,
}

impl ProjectFrom<Order> for OrderDetail {
    fn project_from(order: &Order) -> Self {
        Self {
            id: order.id,
            number: order.number.clone(),
            customer: order.customer.clone(),
            total: order.total,
            status: order.status,
            created_at: order.created_at,
        }
    }
}

/// Create input. Identity is caller-assigned, as the store does not
/// generate keys.
#[derive(Debug, Clone)]
pub struct OrderCreate {
    pub id: i64,
    pub number: String,
    pub customer: String,
    pub total: Decimal,
    pub status: i32,
}

impl IntoRecord<Order> for OrderCreate {
    fn into_record(self) -> Order {
        Order {
            id: self.id,
            number: self.number,
            customer: self.customer,
            total: self.total,
            status: self.status,
            created_at: Utc::now(),
            created_by: Uuid::nil(),
            updated_at: None,
            updated_by: None,
        }
    }
}

/// Update input; absent optionals leave the target field untouched.
#[derive(Debug, Clone, Default)]
pub struct OrderUpdate {
    pub customer: Option<String>,
    pub total: Option<Decimal>,
    pub status: Option<i32>,
}

impl MergeInto<Order> for OrderUpdate {
    fn merge_into(&self, order: &mut Order) {
        if let Some(customer) = &self.customer {
            order.customer = customer.clone();
        }
        if let Some(total) = self.total {
            order.total = total;
        }
        if let Some(status) = self.status {
            order.status = status;
        }
    }
}

/// `count` orders with ids `1..=count` and strictly increasing creation
/// times, so newest-first ordering is the reverse id order.
pub fn seed_orders(count: i64) -> Vec<Order> {
    (1..=count)
        .map(|i| Order {
            id: i,
            number: format!("ORD-{i:05}"),
            customer: format!("customer-{}", i % 7),
            total: Decimal::from(i * 10),
            status: (i % 3) as i32,
            created_at: minted_at(i),
            created_by: Uuid::nil(),
            updated_at: None,
            updated_by: None,
        })
        .collect()
}

pub fn order_store(count: i64) -> Arc<InMemoryStore<Order>> {
    Arc::new(InMemoryStore::with_rows(seed_orders(count)))
}
