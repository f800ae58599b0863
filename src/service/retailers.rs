//! Retailer lifecycle: the analytics table must exist before a record is written,
//! and the warehouse dataset follows every write.

use crate::error::{AppError, WarehouseError};
use crate::models::RetailerConfig;
use crate::service::FieldError;
use crate::state::AppState;

pub struct RetailerService;

impl RetailerService {
    pub async fn list(state: &AppState) -> Result<Vec<RetailerConfig>, AppError> {
        Ok(state.store.list_retailers().await?)
    }

    pub async fn get(state: &AppState, name: &str) -> Result<RetailerConfig, AppError> {
        state
            .store
            .get_retailer(name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("retailer '{}'", name)))
    }

    async fn require_analytics_table(state: &AppState, config: &RetailerConfig) -> Result<(), AppError> {
        let table = config
            .analytics_table()
            .ok_or_else(|| AppError::Unprocessable(format!("invalid analytics table '{}'", config.ga_table)))?;
        if !state.warehouse.table_exists(table.dataset, table.table).await? {
            return Err(AppError::Unprocessable(format!(
                "analytics table '{}' does not exist",
                config.ga_table
            )));
        }
        Ok(())
    }

    /// The dataset is dropped with CASCADE on delete, so it must belong to this retailer alone.
    async fn require_own_dataset(state: &AppState, config: &RetailerConfig) -> Result<(), AppError> {
        if let Some(reason) = config.reserved_dataset(&state.coop_schema) {
            return Err(AppError::Validation(vec![FieldError::new(
                "dataset",
                format!("dataset {} and cannot be used", reason),
                "value_error.reserved",
            )]));
        }
        let dataset = config.dataset_name();
        let taken_by = state
            .store
            .list_retailers()
            .await?
            .into_iter()
            .find(|r| r.name != config.name && r.dataset_name() == dataset);
        if let Some(other) = taken_by {
            return Err(AppError::Conflict(format!(
                "dataset '{}' belongs to retailer '{}'",
                dataset, other.name
            )));
        }
        Ok(())
    }

    /// Insert, then create the dataset. A failed dataset creation removes the record again.
    pub async fn create(state: &AppState, config: RetailerConfig) -> Result<RetailerConfig, AppError> {
        let config = config.without_timestamps();
        if state.store.get_retailer(&config.name).await?.is_some() {
            return Err(AppError::Conflict(format!("retailer '{}'", config.name)));
        }
        Self::require_own_dataset(state, &config).await?;
        Self::require_analytics_table(state, &config).await?;
        let stored = state.store.insert_retailer(&config).await?;
        if let Err(e) = state.warehouse.create_dataset(&stored).await {
            tracing::warn!(retailer = %stored.name, error = %e, "dataset creation failed, rolling back");
            if let Err(undo) = state.store.delete_retailer(&stored.name).await {
                tracing::error!(retailer = %stored.name, error = %undo, "rollback failed");
            }
            return Err(e.into());
        }
        tracing::info!(retailer = %stored.name, "retailer created");
        Ok(stored)
    }

    /// Replace a retailer's settings. The previous record is restored if the dataset cannot follow.
    pub async fn update(state: &AppState, name: &str, config: RetailerConfig) -> Result<RetailerConfig, AppError> {
        let config = config.without_timestamps();
        let previous = Self::get(state, name).await?;
        if config.name != name {
            return Err(AppError::Unprocessable(format!(
                "name '{}' does not match path '{}'; retailers cannot be renamed",
                config.name, name
            )));
        }
        Self::require_own_dataset(state, &config).await?;
        Self::require_analytics_table(state, &config).await?;
        let stored = state
            .store
            .update_retailer(name, &config)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("retailer '{}'", name)))?;
        let synced = if previous.dataset_name() != stored.dataset_name() {
            Self::move_dataset(state, &previous, &stored).await
        } else {
            state.warehouse.update_dataset(&stored).await
        };
        if let Err(e) = synced {
            tracing::warn!(retailer = %name, error = %e, "dataset update failed, restoring previous record");
            if let Err(undo) = state.store.restore_retailer(&previous).await {
                tracing::error!(retailer = %name, error = %undo, "rollback failed");
            }
            return Err(e.into());
        }
        tracing::info!(retailer = %name, "retailer updated");
        Ok(stored)
    }

    /// Create the new dataset, then drop the old one. If the old one cannot be
    /// dropped the new one is removed again so only the previous dataset remains.
    async fn move_dataset(
        state: &AppState,
        previous: &RetailerConfig,
        next: &RetailerConfig,
    ) -> Result<(), WarehouseError> {
        state.warehouse.create_dataset(next).await?;
        if let Err(e) = state.warehouse.drop_dataset(previous).await {
            if let Err(undo) = state.warehouse.drop_dataset(next).await {
                tracing::error!(retailer = %next.name, dataset = %next.dataset_name(), error = %undo, "orphaned dataset");
            }
            return Err(e);
        }
        Ok(())
    }

    /// Delete the record, its co-ops, then its dataset.
    pub async fn delete(state: &AppState, name: &str) -> Result<(), AppError> {
        let config = Self::get(state, name).await?;
        state.store.delete_retailer(name).await?;
        let removed = state.store.delete_coops_by_retailer(name).await?;
        state.warehouse.drop_dataset(&config).await?;
        tracing::info!(retailer = %name, coops_removed = removed, "retailer deleted");
        Ok(())
    }
}
