//! Order status/field editor
//!
//! Applies a validated admin edit to an order's contact, shipping, status and
//! discount fields, recomputing the derived monetary fields from the order's
//! own line items. Validation and phone normalization happen at the handler
//! boundary; this service owns the persistence semantics.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    TransactionTrait,
    sea_query::Expr,
};
use tracing::debug;

use crate::config::{AppConfig, ZONE_INSIDE_DHAKA};
use crate::entities::{orders, prelude::Orders};
use crate::services::settings::DeliveryCharge;

#[derive(Debug)]
pub enum OrderUpdateError {
    OrderNotFound(i32),
    Db(DbErr),
}

impl std::fmt::Display for OrderUpdateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderUpdateError::OrderNotFound(id) => write!(f, "Order {} not found", id),
            OrderUpdateError::Db(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for OrderUpdateError {}

impl From<DbErr> for OrderUpdateError {
    fn from(e: DbErr) -> Self {
        OrderUpdateError::Db(e)
    }
}

/// A fully validated order edit, ready to persist.
#[derive(Debug, Clone)]
pub struct OrderUpdate {
    pub name: String,
    /// Already normalized to the international prefix
    pub phone: String,
    pub email: Option<String>,
    pub address: String,
    pub note: Option<String>,
    pub status: String,
    pub shipping_area: String,
    pub shipping_cost: Decimal,
    pub discount: i64,
    pub advanced: i64,
}

/// Persist an admin edit atomically.
///
/// Subtotal is recomputed from the order's current line items, never from
/// client input. `status_at` is stamped on every update; `shipped_at` only on
/// the first transition into the shipping status and never overwritten.
pub async fn apply_update(
    db: &DatabaseConnection,
    shipping_status: &str,
    order_id: i32,
    update: OrderUpdate,
) -> Result<orders::Model, OrderUpdateError> {
    let txn = db.begin().await?;

    let order = Orders::find_by_id(order_id)
        .one(&txn)
        .await?
        .ok_or(OrderUpdateError::OrderNotFound(order_id))?;

    let now = Utc::now();
    let stamp_shipped = should_stamp_shipped(
        &order.status,
        order.shipped_at.is_some(),
        &update.status,
        shipping_status,
    );

    let data = orders::OrderData {
        subtotal: order.products.subtotal(),
        shipping_cost: update.shipping_cost,
        shipping_area: Some(update.shipping_area),
        discount: update.discount,
        advanced: update.advanced,
    };

    debug!(order_id, status = %update.status, stamp_shipped, "applying order edit");

    let mut active: orders::ActiveModel = order.into();
    active.name = Set(update.name);
    active.phone = Set(update.phone);
    active.email = Set(update.email);
    active.address = Set(update.address);
    active.note = Set(update.note);
    active.status = Set(update.status);
    active.status_at = Set(Some(now.into()));
    if stamp_shipped {
        active.shipped_at = Set(Some(now.into()));
    }
    active.data = Set(data);

    let order = active.update(&txn).await?;
    txn.commit().await?;
    Ok(order)
}

/// Apply one status to a batch of orders in a single UPDATE.
///
/// `status_at` is stamped for every targeted order. When the new status is
/// the shipping status, `shipped_at` is stamped unconditionally, without the
/// per-order prior-status guard the single-order editor applies.
pub async fn bulk_status_update(
    db: &DatabaseConnection,
    shipping_status: &str,
    order_ids: &[i32],
    status: &str,
) -> Result<u64, DbErr> {
    let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();

    let mut update = Orders::update_many()
        .col_expr(orders::Column::Status, Expr::value(status))
        .col_expr(orders::Column::StatusAt, Expr::value(now));
    if status == shipping_status {
        update = update.col_expr(orders::Column::ShippedAt, Expr::value(now));
    }

    let result = update
        .filter(orders::Column::Id.is_in(order_ids.to_vec()))
        .exec(db)
        .await?;

    debug!(count = result.rows_affected, status, "bulk status update");
    Ok(result.rows_affected)
}

/// Shipping cost for a zone: the delivery_charge setting wins, the configured
/// service-level rates are the fallback.
pub fn resolve_shipping_cost(
    charge: Option<&DeliveryCharge>,
    config: &AppConfig,
    zone: &str,
) -> Decimal {
    match charge {
        Some(c) => {
            if zone == ZONE_INSIDE_DHAKA {
                c.inside_dhaka
            } else {
                c.outside_dhaka
            }
        }
        None => {
            if zone == ZONE_INSIDE_DHAKA {
                config.inside_dhaka_rate
            } else {
                config.outside_dhaka_rate
            }
        }
    }
}

/// shipped_at is stamped exactly once: on a transition into the shipping
/// status, and only if it was never stamped before.
fn should_stamp_shipped(
    current_status: &str,
    already_shipped: bool,
    new_status: &str,
    shipping_status: &str,
) -> bool {
    new_status == shipping_status && current_status != shipping_status && !already_shipped
}
