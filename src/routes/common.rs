//! Common routes: health, readiness, version, OpenAPI document.

use crate::models::{CoopCampaignConfig, RetailerConfig};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(title = "coop-conversions"),
    components(schemas(RetailerConfig, CoopCampaignConfig))
)]
pub struct ApiDoc;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

#[derive(Serialize)]
struct ReadyBody {
    status: &'static str,
    store: &'static str,
    warehouse: &'static str,
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyBody>) {
    let store = match state.store.ping().await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!(error = %e, "config store not ready");
            "unavailable"
        }
    };
    let warehouse = match state.warehouse.ping().await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!(error = %e, "warehouse not ready");
            "unavailable"
        }
    };
    if store == "ok" && warehouse == "ok" {
        (StatusCode::OK, Json(ReadyBody { status: "ok", store, warehouse }))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyBody { status: "degraded", store, warehouse }),
        )
    }
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// GET /health, /ready, /version, /openapi.json.
pub fn common_routes_with_ready(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
        .route("/openapi.json", get(openapi))
        .with_state(state)
}
