//! Server: ensures the config tables exist, connects the warehouse, mounts every route.

use coop_conversions::{app, ensure_config_tables, ensure_database_exists, AppState, PgConfigStore, PgWarehouse, Settings};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("coop_conversions=info,tower_http=info")),
        )
        .init();

    ensure_database_exists(&settings.database_url).await?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(settings.max_db_connections)
        .connect(&settings.database_url)
        .await?;
    ensure_config_tables(&pool, &settings.coop_schema).await?;

    let warehouse_pool = if settings.warehouse_url == settings.database_url {
        pool.clone()
    } else {
        sqlx::postgres::PgPoolOptions::new()
            .max_connections(settings.max_db_connections)
            .connect(&settings.warehouse_url)
            .await?
    };

    let state = AppState::new(
        Arc::new(PgConfigStore::new(pool, &settings.coop_schema)),
        Arc::new(PgWarehouse::new(warehouse_pool)),
        &settings.coop_schema,
    );
    let router = app(state)
        .layer(RequestBodyLimitLayer::new(settings.body_limit_bytes))
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(settings.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}
