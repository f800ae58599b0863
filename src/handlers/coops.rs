//! Co-op campaign CRUD handlers and conversion export.

use crate::error::AppError;
use crate::models::CoopCampaignConfig;
use crate::response::{success_many, success_one, success_one_ok};
use crate::service::{CoopService, RequestValidator};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct CoopFilter {
    pub retailer_name: Option<String>,
}

/// GET /api/coops?retailer_name=
pub async fn list_coops(
    State(state): State<AppState>,
    Query(filter): Query<CoopFilter>,
) -> Result<impl IntoResponse, AppError> {
    let coops = CoopService::list(&state, filter.retailer_name.as_deref()).await?;
    Ok(success_many(coops))
}

pub async fn get_coop(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(CoopService::get(&state, &name).await?))
}

pub async fn create_coop(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let config: CoopCampaignConfig = RequestValidator::parse(body)?;
    Ok(success_one(CoopService::create(&state, config).await?))
}

pub async fn update_coop(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let config: CoopCampaignConfig = RequestValidator::parse(body)?;
    Ok(success_one_ok(CoopService::update(&state, &name, config).await?))
}

pub async fn delete_coop(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    CoopService::delete(&state, &name).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/coops/:name/conversions — CSV body, empty when extraction failed.
pub async fn get_conversions(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let csv = CoopService::conversions(&state, &name).await?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
        csv,
    ))
}
