//! SeaORM Entity for orders
//!
//! The `products` column holds the order's cart snapshot as JSONB, the `data`
//! column the derived monetary fields. Line items are denormalized copies of
//! the product taken at add time and are never re-derived from the live
//! product rows.

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Customer name
    pub name: String,
    /// Customer phone in international form (+8801XXXXXXXXX)
    pub phone: String,
    pub email: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub address: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub note: Option<String>,
    /// One of the configured order statuses
    pub status: String,
    /// Stamped on every successful admin edit, whether or not status changed
    pub status_at: Option<DateTimeWithTimeZone>,
    /// Stamped once, the first time the order enters the shipping status
    pub shipped_at: Option<DateTimeWithTimeZone>,
    /// Cart snapshot at time of mutation
    #[sea_orm(column_type = "JsonBinary")]
    pub products: LineItems,
    /// Derived monetary fields
    #[sea_orm(column_type = "JsonBinary")]
    pub data: OrderData,
    pub created_at: Option<DateTimeWithTimeZone>,
}

/// Denormalized product snapshot embedded in an order.
///
/// `name`/`slug`/`image`/`price` are copied from the product when the line is
/// added and stay fixed afterwards; only `quantity` and `total` change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product id the snapshot was taken from
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub image: String,
    /// Selling price at add time
    pub price: Decimal,
    pub quantity: i32,
    /// Always `quantity * price`
    pub total: Decimal,
}

impl LineItem {
    /// Snapshot a product at add time. `quantity` is assumed already clamped
    /// against available stock.
    pub fn snapshot(product: &super::products::Model, quantity: i32) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            slug: product.slug.clone(),
            image: product.base_image.clone(),
            price: product.selling_price,
            quantity,
            total: product.selling_price * Decimal::from(quantity),
        }
    }

    /// Change the quantity, keeping `total == quantity * price`.
    pub fn requantify(&mut self, quantity: i32) {
        self.quantity = quantity;
        self.total = self.price * Decimal::from(quantity);
    }
}

/// Ordered line-item list stored in the `products` JSONB column
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct LineItems(pub Vec<LineItem>);

impl LineItems {
    pub fn subtotal(&self) -> Decimal {
        self.0.iter().map(|li| li.total).sum()
    }

    pub fn contains_product(&self, product_id: i32) -> bool {
        self.0.iter().any(|li| li.id == product_id)
    }
}

/// Derived monetary fields stored in the `data` JSONB column.
///
/// The field set is fixed; `subtotal` always equals the sum of line totals.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct OrderData {
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub shipping_area: Option<String>,
    pub discount: i64,
    pub advanced: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
