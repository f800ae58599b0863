//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::service::FieldError;

/// Start-up configuration errors (environment, bootstrap).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("invalid DATABASE_URL: {0}")]
    DatabaseUrl(String),
    #[error("bootstrap: {0}")]
    Bootstrap(#[from] sqlx::Error),
}

/// Errors raised by a [`crate::store::ConfigStore`].
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("already exists: {0}")]
    Duplicate(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("corrupt payload for {name}: {source}")]
    Payload {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised by a [`crate::warehouse::Warehouse`].
#[derive(Error, Debug)]
pub enum WarehouseError {
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("{0}")]
    Unavailable(String),
}

/// Failures inside the conversion export. Logged, never surfaced to clients.
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("warehouse: {0}")]
    Warehouse(#[from] WarehouseError),
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv output is not utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error("{0}")]
    Unprocessable(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("store: {0}")]
    Store(StoreError),
    #[error("warehouse: {0}")]
    Warehouse(#[from] WarehouseError),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate(name) => AppError::Conflict(name),
            other => AppError::Store(other),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AppError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            AppError::Unprocessable(_) => (StatusCode::UNPROCESSABLE_ENTITY, "unprocessable"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store_error"),
            AppError::Warehouse(_) => (StatusCode::BAD_GATEWAY, "warehouse_error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code, "request failed");
        }
        let details = match &self {
            AppError::Validation(errors) => serde_json::to_value(errors).ok(),
            _ => None,
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details,
            },
        };
        (status, Json(body)).into_response()
    }
}
