//! Shared application state for all routes.

use crate::store::ConfigStore;
use crate::warehouse::Warehouse;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ConfigStore>,
    pub warehouse: Arc<dyn Warehouse>,
    /// Schema holding the config tables; no retailer dataset may take this name.
    pub coop_schema: Arc<str>,
}

impl AppState {
    pub fn new(store: Arc<dyn ConfigStore>, warehouse: Arc<dyn Warehouse>, coop_schema: &str) -> Self {
        AppState {
            store,
            warehouse,
            coop_schema: Arc::from(coop_schema),
        }
    }
}
