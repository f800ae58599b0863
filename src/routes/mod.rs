//! Routers per resource, merged by the binary.

mod common;
mod coops;
mod retailers;

pub use common::{common_routes_with_ready, ApiDoc};
pub use coops::coop_routes;
pub use retailers::retailer_routes;

use crate::state::AppState;
use axum::Router;

/// Every route the service exposes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(common_routes_with_ready(state.clone()))
        .merge(retailer_routes(state.clone()))
        .merge(coop_routes(state))
}
