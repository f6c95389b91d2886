//! Shared fixtures for the strata test suites.
//!
//! Two sample entities cover both identity shapes: [`Order`] has a single
//! key, [`OrderLine`] a composite one. Both carry storage column names that
//! differ from their logical property names, so resolution paths get
//! exercised by every suite that uses them.

pub mod order;
pub mod order_line;

pub use order::{
    order_store, seed_orders, Order, OrderCreate, OrderDetail, OrderSummary, OrderUpdate,
};
pub use order_line::{line_store, seed_order_lines, OrderLine, OrderLineUpdate};

use chrono::{DateTime, Duration, TimeZone, Utc};

/// Deterministic creation timestamp `minutes` after the fixture epoch.
pub fn minted_at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
}
