//! In-process [`ConfigStore`] for tests and local runs without PostgreSQL.

use super::ConfigStore;
use crate::error::StoreError;
use crate::models::{CoopCampaignConfig, RetailerConfig};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::RwLock;

#[derive(Default)]
pub struct MemoryConfigStore {
    retailers: RwLock<BTreeMap<String, RetailerConfig>>,
    coops: RwLock<BTreeMap<String, CoopCampaignConfig>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("lock poisoned".into())
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn list_retailers(&self) -> Result<Vec<RetailerConfig>, StoreError> {
        let map = self.retailers.read().map_err(|_| poisoned())?;
        Ok(map.values().cloned().collect())
    }

    async fn get_retailer(&self, name: &str) -> Result<Option<RetailerConfig>, StoreError> {
        let map = self.retailers.read().map_err(|_| poisoned())?;
        Ok(map.get(name).cloned())
    }

    async fn insert_retailer(&self, config: &RetailerConfig) -> Result<RetailerConfig, StoreError> {
        let mut map = self.retailers.write().map_err(|_| poisoned())?;
        if map.contains_key(&config.name) {
            return Err(StoreError::Duplicate(config.name.clone()));
        }
        let now = Utc::now();
        let mut stored = config.clone();
        stored.created_at = Some(now);
        stored.updated_at = Some(now);
        map.insert(stored.name.clone(), stored.clone());
        Ok(stored)
    }

    async fn update_retailer(&self, name: &str, config: &RetailerConfig) -> Result<Option<RetailerConfig>, StoreError> {
        let mut map = self.retailers.write().map_err(|_| poisoned())?;
        let Some(existing) = map.get_mut(name) else {
            return Ok(None);
        };
        let created_at = existing.created_at;
        *existing = config.clone();
        existing.created_at = created_at;
        existing.updated_at = Some(Utc::now());
        Ok(Some(existing.clone()))
    }

    async fn restore_retailer(&self, config: &RetailerConfig) -> Result<(), StoreError> {
        let mut map = self.retailers.write().map_err(|_| poisoned())?;
        map.insert(config.name.clone(), config.clone());
        Ok(())
    }

    async fn delete_retailer(&self, name: &str) -> Result<bool, StoreError> {
        let mut map = self.retailers.write().map_err(|_| poisoned())?;
        Ok(map.remove(name).is_some())
    }

    async fn list_coops(&self, retailer_name: Option<&str>) -> Result<Vec<CoopCampaignConfig>, StoreError> {
        let map = self.coops.read().map_err(|_| poisoned())?;
        Ok(map
            .values()
            .filter(|c| retailer_name.map_or(true, |r| c.retailer_name == r))
            .cloned()
            .collect())
    }

    async fn get_coop(&self, name: &str) -> Result<Option<CoopCampaignConfig>, StoreError> {
        let map = self.coops.read().map_err(|_| poisoned())?;
        Ok(map.get(name).cloned())
    }

    async fn insert_coop(&self, config: &CoopCampaignConfig) -> Result<CoopCampaignConfig, StoreError> {
        let mut map = self.coops.write().map_err(|_| poisoned())?;
        if map.contains_key(&config.name) {
            return Err(StoreError::Duplicate(config.name.clone()));
        }
        let now = Utc::now();
        let mut stored = config.clone();
        stored.created_at = Some(now);
        stored.updated_at = Some(now);
        map.insert(stored.name.clone(), stored.clone());
        Ok(stored)
    }

    async fn update_coop(&self, name: &str, config: &CoopCampaignConfig) -> Result<Option<CoopCampaignConfig>, StoreError> {
        let mut map = self.coops.write().map_err(|_| poisoned())?;
        let Some(existing) = map.get_mut(name) else {
            return Ok(None);
        };
        let created_at = existing.created_at;
        *existing = config.clone();
        existing.created_at = created_at;
        existing.updated_at = Some(Utc::now());
        Ok(Some(existing.clone()))
    }

    async fn delete_coop(&self, name: &str) -> Result<bool, StoreError> {
        let mut map = self.coops.write().map_err(|_| poisoned())?;
        Ok(map.remove(name).is_some())
    }

    async fn delete_coops_by_retailer(&self, retailer_name: &str) -> Result<u64, StoreError> {
        let mut map = self.coops.write().map_err(|_| poisoned())?;
        let before = map.len();
        map.retain(|_, c| c.retailer_name != retailer_name);
        Ok((before - map.len()) as u64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn coop(name: &str, retailer: &str) -> CoopCampaignConfig {
        serde_json::from_value(json!({
            "name": name,
            "retailer_name": retailer,
            "utm_campaigns": ["c"],
            "conversion_name": "Purchase"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn duplicate_insert_is_rejected() {
        let store = MemoryConfigStore::new();
        let r: RetailerConfig = serde_json::from_value(json!({"name": "acme", "ga_table": "a.b"})).unwrap();
        let stored = store.insert_retailer(&r).await.unwrap();
        assert!(stored.created_at.is_some());
        assert!(matches!(store.insert_retailer(&r).await, Err(StoreError::Duplicate(n)) if n == "acme"));
    }

    #[tokio::test]
    async fn cascade_only_touches_matching_retailer() {
        let store = MemoryConfigStore::new();
        store.insert_coop(&coop("one", "acme")).await.unwrap();
        store.insert_coop(&coop("two", "acme")).await.unwrap();
        store.insert_coop(&coop("three", "other")).await.unwrap();
        assert_eq!(store.delete_coops_by_retailer("acme").await.unwrap(), 2);
        let left = store.list_coops(None).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].name, "three");
    }

    #[tokio::test]
    async fn update_keeps_created_at() {
        let store = MemoryConfigStore::new();
        let first = store.insert_coop(&coop("one", "acme")).await.unwrap();
        let mut changed = coop("one", "acme");
        changed.conversion_name = "Sale".into();
        let updated = store.update_coop("one", &changed).await.unwrap().unwrap();
        assert_eq!(updated.created_at, first.created_at);
        assert_eq!(updated.conversion_name, "Sale");
        assert!(store.update_coop("missing", &changed).await.unwrap().is_none());
    }
}
