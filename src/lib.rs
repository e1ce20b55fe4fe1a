// src/lib.rs

use sea_orm::DatabaseConnection;

use config::AppConfig;
use services::settings::SettingsService;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub settings: SettingsService,
}

pub mod config;

pub mod entities {
    pub mod prelude;
    pub mod orders;
    pub mod products;
    pub mod settings;
}

pub mod services {
    pub mod cart;
    pub mod orders;
    pub mod settings;
}

pub mod models;
pub mod handlers;
