//! Co-op campaign lifecycle. Every co-op must point at an existing retailer.

use crate::error::AppError;
use crate::models::{CoopCampaignConfig, CoopWithRetailer};
use crate::service::ConversionService;
use crate::state::AppState;

pub struct CoopService;

impl CoopService {
    pub async fn list(state: &AppState, retailer_name: Option<&str>) -> Result<Vec<CoopCampaignConfig>, AppError> {
        Ok(state.store.list_coops(retailer_name).await?)
    }

    pub async fn get(state: &AppState, name: &str) -> Result<CoopCampaignConfig, AppError> {
        state
            .store
            .get_coop(name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("coop '{}'", name)))
    }

    async fn require_retailer(state: &AppState, config: &CoopCampaignConfig) -> Result<(), AppError> {
        if state.store.get_retailer(&config.retailer_name).await?.is_none() {
            return Err(AppError::Unprocessable(format!(
                "retailer '{}' does not exist",
                config.retailer_name
            )));
        }
        Ok(())
    }

    pub async fn create(state: &AppState, config: CoopCampaignConfig) -> Result<CoopCampaignConfig, AppError> {
        let config = config.without_timestamps();
        if state.store.get_coop(&config.name).await?.is_some() {
            return Err(AppError::Conflict(format!("coop '{}'", config.name)));
        }
        Self::require_retailer(state, &config).await?;
        let stored = state.store.insert_coop(&config).await?;
        tracing::info!(coop = %stored.name, retailer = %stored.retailer_name, "coop created");
        Ok(stored)
    }

    pub async fn update(state: &AppState, name: &str, config: CoopCampaignConfig) -> Result<CoopCampaignConfig, AppError> {
        let config = config.without_timestamps();
        Self::get(state, name).await?;
        if config.name != name {
            return Err(AppError::Unprocessable(format!(
                "name '{}' does not match path '{}'; coops cannot be renamed",
                config.name, name
            )));
        }
        Self::require_retailer(state, &config).await?;
        state
            .store
            .update_coop(name, &config)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("coop '{}'", name)))
    }

    pub async fn delete(state: &AppState, name: &str) -> Result<(), AppError> {
        if !state.store.delete_coop(name).await? {
            return Err(AppError::NotFound(format!("coop '{}'", name)));
        }
        tracing::info!(coop = %name, "coop deleted");
        Ok(())
    }

    /// The co-op joined with its retailer.
    pub async fn with_retailer(state: &AppState, name: &str) -> Result<CoopWithRetailer, AppError> {
        let coop = Self::get(state, name).await?;
        let retailer = state
            .store
            .get_retailer(&coop.retailer_name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("retailer '{}'", coop.retailer_name)))?;
        Ok(CoopWithRetailer { coop, retailer })
    }

    /// CSV export for one co-op; empty when extraction fails.
    pub async fn conversions(state: &AppState, name: &str) -> Result<String, AppError> {
        let config = Self::with_retailer(state, name).await?;
        Ok(ConversionService::new(state.warehouse.as_ref(), &config)
            .get_conversions()
            .await)
    }
}
