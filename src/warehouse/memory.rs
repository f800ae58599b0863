//! In-process [`Warehouse`] for tests: tracks datasets and serves canned query results.

use super::{QueryParam, QueryTable, Warehouse};
use crate::error::WarehouseError;
use crate::models::RetailerConfig;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

#[derive(Default)]
struct Inner {
    tables: BTreeSet<(String, String)>,
    /// dataset name -> analytics table it points at
    datasets: BTreeMap<String, String>,
    query_result: Option<QueryTable>,
    fail_queries: bool,
    fail_dataset_writes: bool,
    fail_drops_of: BTreeSet<String>,
    fail_ping: bool,
    queries: Vec<(String, Vec<QueryParam>)>,
}

#[derive(Default)]
pub struct MemoryWarehouse {
    inner: Mutex<Inner>,
}

impl MemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, WarehouseError> {
        self.inner
            .lock()
            .map_err(|_| WarehouseError::Unavailable("lock poisoned".into()))
    }

    /// Register an existing analytics table.
    pub fn add_table(&self, dataset: &str, table: &str) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.tables.insert((dataset.to_string(), table.to_string()));
        }
    }

    /// Rows every subsequent [`Warehouse::query`] returns.
    pub fn set_query_result(&self, result: QueryTable) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.query_result = Some(result);
        }
    }

    pub fn fail_queries(&self, fail: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_queries = fail;
        }
    }

    /// Make create/update/drop of datasets fail.
    pub fn fail_dataset_writes(&self, fail: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_dataset_writes = fail;
        }
    }

    /// Make dropping this one dataset fail; other writes still succeed.
    pub fn fail_drop_of(&self, dataset: &str) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_drops_of.insert(dataset.to_string());
        }
    }

    pub fn fail_ping(&self, fail: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_ping = fail;
        }
    }

    pub fn datasets(&self) -> BTreeMap<String, String> {
        self.inner.lock().map(|i| i.datasets.clone()).unwrap_or_default()
    }

    pub fn queries(&self) -> Vec<(String, Vec<QueryParam>)> {
        self.inner.lock().map(|i| i.queries.clone()).unwrap_or_default()
    }

    fn write_dataset(&self, retailer: &RetailerConfig) -> Result<(), WarehouseError> {
        let mut inner = self.lock()?;
        if inner.fail_dataset_writes {
            return Err(WarehouseError::Unavailable("dataset writes disabled".into()));
        }
        inner.datasets.insert(retailer.dataset_name(), retailer.ga_table.clone());
        Ok(())
    }
}

#[async_trait]
impl Warehouse for MemoryWarehouse {
    async fn table_exists(&self, dataset: &str, table: &str) -> Result<bool, WarehouseError> {
        let inner = self.lock()?;
        Ok(inner.tables.contains(&(dataset.to_string(), table.to_string())))
    }

    async fn create_dataset(&self, retailer: &RetailerConfig) -> Result<(), WarehouseError> {
        self.write_dataset(retailer)
    }

    async fn update_dataset(&self, retailer: &RetailerConfig) -> Result<(), WarehouseError> {
        self.write_dataset(retailer)
    }

    async fn drop_dataset(&self, retailer: &RetailerConfig) -> Result<(), WarehouseError> {
        let mut inner = self.lock()?;
        let dataset = retailer.dataset_name();
        if inner.fail_dataset_writes || inner.fail_drops_of.contains(&dataset) {
            return Err(WarehouseError::Unavailable(format!("cannot drop {}", dataset)));
        }
        inner.datasets.remove(&dataset);
        Ok(())
    }

    async fn query(&self, sql: &str, params: &[QueryParam]) -> Result<QueryTable, WarehouseError> {
        let mut inner = self.lock()?;
        inner.queries.push((sql.to_string(), params.to_vec()));
        if inner.fail_queries {
            return Err(WarehouseError::Unavailable("query failed".into()));
        }
        Ok(inner.query_result.clone().unwrap_or_default())
    }

    async fn ping(&self) -> Result<(), WarehouseError> {
        if self.lock()?.fail_ping {
            return Err(WarehouseError::Unavailable("warehouse unreachable".into()));
        }
        Ok(())
    }
}
