//! Retailer routes, mounted at the root (paths carry the /api prefix).

use crate::handlers::retailers::{create_retailer, delete_retailer, get_retailer, list_retailers, update_retailer};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn retailer_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/retailers", get(list_retailers).post(create_retailer))
        .route(
            "/api/retailers/:name",
            get(get_retailer).put(update_retailer).delete(delete_retailer),
        )
        .with_state(state)
}
