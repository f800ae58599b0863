#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use coop_conversions::{app, AppState, ConfigStore, MemoryConfigStore, MemoryWarehouse};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryConfigStore>,
    pub warehouse: Arc<MemoryWarehouse>,
}

/// Router over in-memory backends with one analytics table, `analytics_1.events`.
pub fn test_app() -> TestApp {
    let store = Arc::new(MemoryConfigStore::new());
    let warehouse = Arc::new(MemoryWarehouse::new());
    warehouse.add_table("analytics_1", "events");
    let state = AppState::new(
        store.clone() as Arc<dyn ConfigStore>,
        warehouse.clone() as Arc<dyn coop_conversions::Warehouse>,
        "coop",
    );
    TestApp {
        router: app(state),
        store,
        warehouse,
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub text: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.text).unwrap()
    }
}

impl TestApp {
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                builder = builder.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let response = self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        TestResponse {
            status,
            content_type,
            text: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }
}

pub fn retailer_body(name: &str) -> Value {
    json!({
        "name": name,
        "ga_table": "analytics_1.events",
        "time_zone": "America/New_York",
        "currency": "USD"
    })
}

pub fn coop_body(name: &str, retailer: &str) -> Value {
    json!({
        "name": name,
        "retailer_name": retailer,
        "utm_campaigns": ["spring_sale"],
        "conversion_name": "Coop Purchase"
    })
}
