//! Composite-key sample entity.
//!
//! Identity is `(OrderId, LineNo)`. The entity doubles as its own list,
//! detail, and create shapes through the identity mapping impls in
//! `strata-core`, which keeps the composite-key suites focused on identity
//! resolution rather than mapping.

use std::sync::Arc;

use chrono::Utc;
use once_cell::sync::Lazy;
use strata_core::{
    AuditedRecord, EntitySchema, FieldKind, FieldValue, MergeInto, Record, Timestamp,
};
use strata_data::InMemoryStore;
use uuid::Uuid;

use crate::minted_at;

#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    pub order_id: i64,
    pub line_no: i32,
    pub sku: String,
    pub quantity: i32,
    pub created_at: Timestamp,
    pub created_by: Uuid,
    pub updated_at: Option<Timestamp>,
    pub updated_by: Option<Uuid>,
}

static LINE_SCHEMA: Lazy<EntitySchema<OrderLine>> = Lazy::new(|| {
    EntitySchema::builder("OrderLine")
        .field("OrderId", FieldKind::I64, |l: &OrderLine| l.order_id.into())
        .column("order_id")
        .field("LineNo", FieldKind::I32, |l: &OrderLine| l.line_no.into())
        .column("line_no")
        .writable(
            "Sku",
            FieldKind::Text,
            |l: &OrderLine| l.sku.clone().into(),
            |l, v| match v {
                FieldValue::Text(s) => {
                    l.sku = s;
                    true
                }
                _ => false,
            },
        )
        .writable(
            "Quantity",
            FieldKind::I32,
            |l: &OrderLine| l.quantity.into(),
            |l, v| match v {
                FieldValue::I32(n) => {
                    l.quantity = n;
                    true
                }
                _ => false,
            },
        )
        .field("CreatedDate", FieldKind::DateTime, |l: &OrderLine| {
            l.created_at.into()
        })
        .column("created_date")
        .identity(&["OrderId", "LineNo"])
        .build()
});

impl Record for OrderLine {
    fn schema() -> &'static EntitySchema<Self> {
        &LINE_SCHEMA
    }
}

impl AuditedRecord for OrderLine {
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

#[derive(Debug, Clone, Default)]
pub struct OrderLineUpdate {
    pub quantity: Option<i32>,
}

impl MergeInto<OrderLine> for OrderLineUpdate {
    fn merge_into(&self, line: &mut OrderLine) {
        if let Some(quantity) = self.quantity {
            line.quantity = quantity;
        }
    }
}

/// One line per `(order, line_no)` pair: `orders × lines_per_order` rows.
pub fn seed_order_lines(orders: i64, lines_per_order: i32) -> Vec<OrderLine> {
    let mut rows = Vec::new();
    for order_id in 1..=orders {
        for line_no in 1..=lines_per_order {
            rows.push(OrderLine {
                order_id,
                line_no,
                sku: format!("SKU-{order_id}-{line_no}"),
                quantity: line_no * 2,
                created_at: minted_at(order_id * 100 + i64::from(line_no)),
                created_by: Uuid::nil(),
                updated_at: None,
                updated_by: None,
            });
        }
    }
    rows
}

pub fn line_store(orders: i64, lines_per_order: i32) -> Arc<InMemoryStore<OrderLine>> {
    Arc::new(InMemoryStore::with_rows(seed_order_lines(
        orders,
        lines_per_order,
    )))
}
