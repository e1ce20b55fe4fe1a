use axum::{
    routing::{get, post, put},
    Router,
};
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use std::env;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bazaar_backend::{config::AppConfig, handlers, services::settings::SettingsService, AppState};

/// Delivery-charge cache TTL in seconds
const SETTINGS_CACHE_TTL_SECS: u64 = 60;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,bazaar_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Connect to database
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    tracing::info!("Connecting to database...");
    let db = Database::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    tracing::info!("Running migrations...");
    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    let state = AppState {
        db,
        config: AppConfig::from_env(),
        settings: SettingsService::new(SETTINGS_CACHE_TTL_SECS),
    };

    // Build router
    let app = Router::new()
        .route("/", get(health))
        .route("/api/orders", get(handlers::orders::list_orders))
        .route("/api/orders/status", post(handlers::orders::bulk_status))
        .route("/api/orders/invoices", get(handlers::orders::invoices))
        .route(
            "/api/orders/{id}",
            get(handlers::orders::show_order)
                .put(handlers::orders::update_order)
                .delete(handlers::orders::destroy_order),
        )
        .route(
            "/api/orders/{id}/products",
            post(handlers::cart::add_product),
        )
        .route(
            "/api/orders/{id}/quantities",
            put(handlers::cart::update_quantities),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Start server
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000")
        .await
        .unwrap();

    tracing::info!("Server listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}

async fn health() -> &'static str {
    "Bazaar admin backend is up"
}
