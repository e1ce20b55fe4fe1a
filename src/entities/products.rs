//! SeaORM Entity for products
//!
//! `stock_count` is only authoritative when `should_track` is true. All stock
//! writes go through the guarded helpers in `services::cart`, never through
//! read-modify-write on the model.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub slug: String,
    /// Merchant stock-keeping unit, unique
    #[sea_orm(unique)]
    pub sku: String,
    pub selling_price: Decimal,
    /// Primary image URL, denormalized onto order lines at add time
    pub base_image: String,
    /// Whether stock is tracked for this product
    pub should_track: bool,
    /// Remaining stock; never negative for tracked products
    pub stock_count: i32,
    pub created_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
