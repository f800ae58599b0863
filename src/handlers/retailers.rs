//! Retailer CRUD handlers.

use crate::error::AppError;
use crate::models::RetailerConfig;
use crate::response::{success_many, success_one, success_one_ok};
use crate::service::{RequestValidator, RetailerService};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;

/// GET /api/retailers
pub async fn list_retailers(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let retailers: Vec<RetailerConfig> = RetailerService::list(&state)
        .await?
        .into_iter()
        .map(RetailerConfig::redacted)
        .collect();
    Ok(success_many(retailers))
}

/// GET /api/retailers/:name
pub async fn get_retailer(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(RetailerService::get(&state, &name).await?.redacted()))
}

/// POST /api/retailers
pub async fn create_retailer(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let config: RetailerConfig = RequestValidator::parse(body)?;
    Ok(success_one(RetailerService::create(&state, config).await?.redacted()))
}

/// PUT /api/retailers/:name
pub async fn update_retailer(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let config: RetailerConfig = RequestValidator::parse(body)?;
    Ok(success_one_ok(RetailerService::update(&state, &name, config).await?.redacted()))
}

/// DELETE /api/retailers/:name — also removes the retailer's co-ops and dataset.
pub async fn delete_retailer(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    RetailerService::delete(&state, &name).await?;
    Ok(StatusCode::NO_CONTENT)
}
