use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, DbErr, Set};
use sea_orm_migration::MigratorTrait;
use std::env;

use bazaar_backend::config::AppConfig;
use bazaar_backend::entities::orders::{self, LineItem, LineItems, OrderData};
use bazaar_backend::entities::products;
use bazaar_backend::services::settings::SettingsService;
use bazaar_backend::AppState;

/// Set up test database connection and run migrations
/// Uses TEST_DATABASE_URL environment variable or falls back to default
pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let database_url = env::var("TEST_DATABASE_URL").unwrap_or_else(|_| {
        "postgresql://bazaar_user@localhost:5432/bazaar_test".to_string()
    });

    let db = Database::connect(&database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// AppState with a deterministic test config (no env reads)
#[allow(dead_code)]
pub fn test_app_state(db: DatabaseConnection) -> AppState {
    AppState {
        db,
        config: AppConfig {
            statuses: vec![
                "Pending".to_string(),
                "Confirmed".to_string(),
                "Shipping".to_string(),
                "Delivered".to_string(),
                "Cancelled".to_string(),
            ],
            shipping_status: "Shipping".to_string(),
            inside_dhaka_rate: Decimal::from(60),
            outside_dhaka_rate: Decimal::from(120),
            admin_api_key: Some("test-admin-key".to_string()),
        },
        settings: SettingsService::new(60),
    }
}

/// A phone unique per call so tests sharing the database don't collide
#[allow(dead_code)]
pub fn unique_phone() -> String {
    let digits: String = uuid::Uuid::new_v4()
        .as_bytes()
        .iter()
        .map(|b| char::from(b'0' + (b % 10)))
        .take(9)
        .collect();
    format!("+8801{}", digits)
}

/// Insert a product with a generated unique SKU
#[allow(dead_code)]
pub async fn seed_product(
    db: &DatabaseConnection,
    price: &str,
    should_track: bool,
    stock_count: i32,
) -> products::Model {
    let sku = format!("SKU-{}", uuid::Uuid::new_v4());
    products::ActiveModel {
        name: Set(format!("Product {}", &sku[4..12])),
        slug: Set(format!("product-{}", &sku[4..12])),
        sku: Set(sku),
        selling_price: Set(price.parse().expect("bad price literal")),
        base_image: Set("/images/test.jpg".to_string()),
        should_track: Set(should_track),
        stock_count: Set(stock_count),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to seed product")
}

/// Insert an order in Pending status with the given cart snapshot
#[allow(dead_code)]
pub async fn seed_order(
    db: &DatabaseConnection,
    phone: &str,
    lines: Vec<LineItem>,
) -> orders::Model {
    seed_order_with_status(db, phone, lines, "Pending", false).await
}

/// Insert an order with an explicit status; `already_shipped` pre-stamps
/// shipped_at with a fixed past timestamp
#[allow(dead_code)]
pub async fn seed_order_with_status(
    db: &DatabaseConnection,
    phone: &str,
    lines: Vec<LineItem>,
    status: &str,
    already_shipped: bool,
) -> orders::Model {
    let lines = LineItems(lines);
    let data = OrderData {
        subtotal: lines.subtotal(),
        ..Default::default()
    };
    let shipped_at = already_shipped.then(|| {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .unwrap()
            .into()
    });

    orders::ActiveModel {
        name: Set("Test Customer".to_string()),
        phone: Set(phone.to_string()),
        address: Set("House 7, Road 3, Dhanmondi, Dhaka".to_string()),
        status: Set(status.to_string()),
        shipped_at: Set(shipped_at),
        products: Set(lines),
        data: Set(data),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to seed order")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_setup_test_db() {
        let db = setup_test_db().await;
        assert!(db.is_ok(), "Test database connection should succeed");
    }
}
