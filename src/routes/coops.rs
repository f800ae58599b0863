use crate::handlers::coops::{create_coop, delete_coop, get_conversions, get_coop, list_coops, update_coop};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn coop_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/coops", get(list_coops).post(create_coop))
        .route("/api/coops/:name", get(get_coop).put(update_coop).delete(delete_coop))
        .route("/api/coops/:name/conversions", get(get_conversions))
        .with_state(state)
}
