//! Config persistence: retailer and co-op records keyed by name.

mod memory;
mod postgres;

pub use memory::MemoryConfigStore;
pub use postgres::{ensure_config_tables, ensure_database_exists, PgConfigStore};
pub(crate) use postgres::quote_ident;

use crate::error::StoreError;
use crate::models::{CoopCampaignConfig, RetailerConfig};
use async_trait::async_trait;

/// Backing store for configuration records. Writes are last-writer-wins.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn list_retailers(&self) -> Result<Vec<RetailerConfig>, StoreError>;
    async fn get_retailer(&self, name: &str) -> Result<Option<RetailerConfig>, StoreError>;
    /// Fails with [`StoreError::Duplicate`] if the name is taken.
    async fn insert_retailer(&self, config: &RetailerConfig) -> Result<RetailerConfig, StoreError>;
    /// Returns `None` when no record has that name.
    async fn update_retailer(&self, name: &str, config: &RetailerConfig) -> Result<Option<RetailerConfig>, StoreError>;
    /// Replaces a record wholesale, timestamps included. Used to undo an update.
    async fn restore_retailer(&self, config: &RetailerConfig) -> Result<(), StoreError>;
    async fn delete_retailer(&self, name: &str) -> Result<bool, StoreError>;

    async fn list_coops(&self, retailer_name: Option<&str>) -> Result<Vec<CoopCampaignConfig>, StoreError>;
    async fn get_coop(&self, name: &str) -> Result<Option<CoopCampaignConfig>, StoreError>;
    async fn insert_coop(&self, config: &CoopCampaignConfig) -> Result<CoopCampaignConfig, StoreError>;
    async fn update_coop(&self, name: &str, config: &CoopCampaignConfig) -> Result<Option<CoopCampaignConfig>, StoreError>;
    async fn delete_coop(&self, name: &str) -> Result<bool, StoreError>;
    /// Removes every co-op owned by a retailer; returns how many went.
    async fn delete_coops_by_retailer(&self, retailer_name: &str) -> Result<u64, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
