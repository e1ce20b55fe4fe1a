//! Line-item manager
//!
//! Keeps an order's cart snapshot (`orders.products`) and the corresponding
//! `products.stock_count` values mutually consistent. Every operation runs in
//! one transaction so stock and order writes land together or not at all.
//!
//! Stock is never adjusted by read-modify-write: decrements go through a
//! floor-guarded `UPDATE ... WHERE stock_count >= n` and are re-clamped
//! against a fresh read when the guard loses a race, so `stock_count` cannot
//! go negative under concurrent requests.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Set, TransactionTrait,
    sea_query::Expr,
};
use std::collections::HashMap;
use tracing::debug;

use crate::entities::{
    orders::{self, LineItem, LineItems, OrderData},
    prelude::{Orders, Products},
    products,
};

#[derive(Debug)]
pub enum CartError {
    OrderNotFound(i32),
    /// Neither a primary key nor a SKU resolved
    ProductNotFound(String),
    /// The product already has a line on this order
    DuplicateProduct(i32),
    /// Tracked product with no available stock
    OutOfStock(i32),
    Db(DbErr),
}

impl std::fmt::Display for CartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CartError::OrderNotFound(id) => write!(f, "Order {} not found", id),
            CartError::ProductNotFound(key) => write!(f, "No product found for '{}'", key),
            CartError::DuplicateProduct(id) => {
                write!(f, "Product {} is already in this order", id)
            }
            CartError::OutOfStock(id) => write!(f, "Product {} is out of stock", id),
            CartError::Db(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for CartError {}

impl From<DbErr> for CartError {
    fn from(e: DbErr) -> Self {
        CartError::Db(e)
    }
}

/// Result of a cart mutation: the persisted order and whether anything
/// actually changed.
#[derive(Debug)]
pub struct CartUpdate {
    pub order: orders::Model,
    pub changed: bool,
}

/// Append a product line to an order.
///
/// `id_or_sku` is resolved as a primary key first, then as a SKU. For tracked
/// products the added quantity is clamped to available stock and the stock is
/// decremented by the clamped amount in the same transaction.
pub async fn add_product(
    db: &DatabaseConnection,
    order_id: i32,
    id_or_sku: &str,
    requested_quantity: i32,
) -> Result<CartUpdate, CartError> {
    let txn = db.begin().await?;

    let order = Orders::find_by_id(order_id)
        .one(&txn)
        .await?
        .ok_or(CartError::OrderNotFound(order_id))?;

    let product = resolve_product(&txn, id_or_sku)
        .await?
        .ok_or_else(|| CartError::ProductNotFound(id_or_sku.to_string()))?;

    if order.products.contains_product(product.id) {
        return Err(CartError::DuplicateProduct(product.id));
    }

    let requested = requested_quantity.max(1);
    let quantity = if product.should_track {
        if product.stock_count <= 0 {
            return Err(CartError::OutOfStock(product.id));
        }
        let claimed = claim_stock(&txn, product.id, requested).await?;
        if claimed == 0 {
            // Stock raced to zero between the read and the guarded decrement
            return Err(CartError::OutOfStock(product.id));
        }
        claimed
    } else {
        requested
    };

    debug!(
        order_id,
        product_id = product.id,
        requested,
        quantity,
        "adding line item"
    );

    let mut lines = order.products.clone();
    lines.0.push(LineItem::snapshot(&product, quantity));
    let data = OrderData {
        subtotal: lines.subtotal(),
        ..order.data.clone()
    };

    let order = persist_cart(&txn, order, lines, data).await?;
    txn.commit().await?;

    Ok(CartUpdate {
        order,
        changed: true,
    })
}

/// Re-quantify an order's lines in one pass.
///
/// Every line currently on the order is processed: the desired quantity is
/// the map entry for its product id, with a missing entry meaning 0. A
/// desired quantity of 0 removes the line and, for tracked products, restores
/// the full line quantity to stock. Increases are clamped so the applied
/// quantity never exceeds the current quantity plus available stock. Lines
/// whose product no longer exists are dropped (their stock cannot be
/// adjusted). Snapshot fields are never refreshed from the live product.
pub async fn update_quantities(
    db: &DatabaseConnection,
    order_id: i32,
    quantities: &HashMap<i32, i32>,
) -> Result<CartUpdate, CartError> {
    let txn = db.begin().await?;

    let order = Orders::find_by_id(order_id)
        .one(&txn)
        .await?
        .ok_or(CartError::OrderNotFound(order_id))?;

    let product_ids: Vec<i32> = order.products.0.iter().map(|li| li.id).collect();
    let live_products: HashMap<i32, products::Model> = Products::find()
        .filter(products::Column::Id.is_in(product_ids))
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut lines = Vec::with_capacity(order.products.0.len());
    for line in &order.products.0 {
        let Some(product) = live_products.get(&line.id) else {
            debug!(order_id, product_id = line.id, "dropping line for deleted product");
            continue;
        };

        let desired = quantities.get(&line.id).copied().unwrap_or(0).max(0);
        let applied = if desired < line.quantity {
            if product.should_track {
                release_stock(&txn, line.id, line.quantity - desired).await?;
            }
            desired
        } else if desired > line.quantity {
            let increase = if product.should_track {
                claim_stock(&txn, line.id, desired - line.quantity).await?
            } else {
                desired - line.quantity
            };
            line.quantity + increase
        } else {
            desired
        };

        if applied > 0 {
            let mut updated = line.clone();
            updated.requantify(applied);
            lines.push(updated);
        }
    }

    let lines = LineItems(lines);
    let data = OrderData {
        subtotal: lines.subtotal(),
        ..order.data.clone()
    };

    let changed = lines != order.products || data != order.data;
    let order = if changed {
        persist_cart(&txn, order, lines, data).await?
    } else {
        order
    };
    txn.commit().await?;

    Ok(CartUpdate { order, changed })
}

/// Restore the stock impact of an order, then delete it.
///
/// Lines whose product still exists and tracks stock are restocked by the
/// line quantity; lines whose product is gone are skipped. The order row is
/// deleted only after all restock increments, in the same transaction.
pub async fn restock_and_delete(db: &DatabaseConnection, order_id: i32) -> Result<(), CartError> {
    let txn = db.begin().await?;

    let order = Orders::find_by_id(order_id)
        .one(&txn)
        .await?
        .ok_or(CartError::OrderNotFound(order_id))?;

    for line in &order.products.0 {
        match Products::find_by_id(line.id).one(&txn).await? {
            Some(product) if product.should_track => {
                release_stock(&txn, line.id, line.quantity).await?;
            }
            Some(_) => {}
            None => {
                debug!(order_id, product_id = line.id, "skipping restock for deleted product");
            }
        }
    }

    Orders::delete_by_id(order.id).exec(&txn).await?;
    txn.commit().await?;
    Ok(())
}

/// Resolve an id-or-SKU lookup key: primary key first, then SKU.
async fn resolve_product<C: ConnectionTrait>(
    conn: &C,
    id_or_sku: &str,
) -> Result<Option<products::Model>, DbErr> {
    if let Ok(id) = id_or_sku.parse::<i32>() {
        if let Some(product) = Products::find_by_id(id).one(conn).await? {
            return Ok(Some(product));
        }
    }
    Products::find()
        .filter(products::Column::Sku.eq(id_or_sku))
        .one(conn)
        .await
}

/// Claim up to `requested` units of stock with a floor-guarded decrement.
///
/// Returns the clamped amount actually claimed (0 when no stock is left or
/// the product is gone). The guard `stock_count >= take` keeps the counter
/// non-negative; when it loses a race the loop re-reads and re-clamps.
async fn claim_stock<C: ConnectionTrait>(
    conn: &C,
    product_id: i32,
    requested: i32,
) -> Result<i32, DbErr> {
    loop {
        let Some(product) = Products::find_by_id(product_id).one(conn).await? else {
            return Ok(0);
        };
        let take = requested.min(product.stock_count.max(0));
        if take == 0 {
            return Ok(0);
        }

        let result = Products::update_many()
            .col_expr(
                products::Column::StockCount,
                Expr::col(products::Column::StockCount).sub(take),
            )
            .filter(products::Column::Id.eq(product_id))
            .filter(products::Column::StockCount.gte(take))
            .exec(conn)
            .await?;
        if result.rows_affected > 0 {
            return Ok(take);
        }
        debug!(product_id, take, "stock claim lost a race, re-reading");
    }
}

/// Return `quantity` units to stock.
async fn release_stock<C: ConnectionTrait>(
    conn: &C,
    product_id: i32,
    quantity: i32,
) -> Result<(), DbErr> {
    Products::update_many()
        .col_expr(
            products::Column::StockCount,
            Expr::col(products::Column::StockCount).add(quantity),
        )
        .filter(products::Column::Id.eq(product_id))
        .exec(conn)
        .await?;
    Ok(())
}

async fn persist_cart<C: ConnectionTrait>(
    conn: &C,
    order: orders::Model,
    lines: LineItems,
    data: OrderData,
) -> Result<orders::Model, DbErr> {
    let mut active: orders::ActiveModel = order.into();
    active.products = Set(lines);
    active.data = Set(data);
    active.update(conn).await
}
