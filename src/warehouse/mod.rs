//! Warehouse integration: analytics table checks, per-retailer datasets, tabular queries.

mod memory;
pub mod params;
mod postgres;

pub use memory::MemoryWarehouse;
pub use params::QueryParam;
pub use postgres::PgWarehouse;

use crate::error::WarehouseError;
use crate::models::RetailerConfig;
use async_trait::async_trait;
use serde_json::Value;

/// Rows returned by a warehouse query, with column names in select order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Name of the view each retailer dataset exposes over its analytics table.
pub const EVENTS_VIEW: &str = "events";

#[async_trait]
pub trait Warehouse: Send + Sync {
    async fn table_exists(&self, dataset: &str, table: &str) -> Result<bool, WarehouseError>;
    /// Create the retailer's dataset and the views inside it.
    async fn create_dataset(&self, retailer: &RetailerConfig) -> Result<(), WarehouseError>;
    /// Re-point the retailer's generated views at its current analytics table.
    async fn update_dataset(&self, retailer: &RetailerConfig) -> Result<(), WarehouseError>;
    /// Drop the retailer's dataset and everything generated in it.
    async fn drop_dataset(&self, retailer: &RetailerConfig) -> Result<(), WarehouseError>;
    async fn query(&self, sql: &str, params: &[QueryParam]) -> Result<QueryTable, WarehouseError>;
    async fn ping(&self) -> Result<(), WarehouseError>;
}
