//! Retailer and co-op campaign configuration API with warehouse-backed conversion export.

pub mod error;
pub mod handlers;
pub mod models;
pub mod response;
pub mod routes;
pub mod service;
pub mod settings;
pub mod state;
pub mod store;
pub mod warehouse;

pub use error::{AppError, ConfigError, ConversionError, StoreError, WarehouseError};
pub use models::{CoopCampaignConfig, CoopWithRetailer, RetailerConfig};
pub use response::{success_many, success_one, success_one_ok};
pub use routes::{app, common_routes_with_ready, coop_routes, retailer_routes};
pub use service::{ConversionService, CoopService, RetailerService};
pub use settings::Settings;
pub use state::AppState;
pub use store::{ensure_config_tables, ensure_database_exists, ConfigStore, MemoryConfigStore, PgConfigStore};
pub use warehouse::{MemoryWarehouse, PgWarehouse, QueryParam, QueryTable, Warehouse};
