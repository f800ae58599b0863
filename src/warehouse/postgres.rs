//! PostgreSQL-backed warehouse. A dataset is a schema; tables live inside it.

use super::{QueryParam, QueryTable, Warehouse, EVENTS_VIEW};
use crate::error::WarehouseError;
use crate::models::RetailerConfig;
use crate::store::quote_ident;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgRow, PgTypeInfo};
use sqlx::{Column, Executor, PgPool, Row, Statement};

#[derive(Clone)]
pub struct PgWarehouse {
    pool: PgPool,
}

impl PgWarehouse {
    pub fn new(pool: PgPool) -> Self {
        PgWarehouse { pool }
    }

    /// (CREATE SCHEMA, CREATE VIEW) for a retailer's dataset.
    fn dataset_ddl(retailer: &RetailerConfig) -> Result<(String, String), WarehouseError> {
        let source = retailer
            .analytics_table()
            .ok_or_else(|| WarehouseError::InvalidIdentifier(retailer.ga_table.clone()))?;
        let dataset = quote_ident(&retailer.dataset_name());
        let create_schema = format!("CREATE SCHEMA IF NOT EXISTS {}", dataset);
        let create_view = format!(
            "CREATE VIEW {}.{} AS SELECT * FROM {}.{}",
            dataset,
            quote_ident(EVENTS_VIEW),
            quote_ident(source.dataset),
            quote_ident(source.table)
        );
        Ok((create_schema, create_view))
    }

    async fn rebuild_views(&self, retailer: &RetailerConfig) -> Result<(), WarehouseError> {
        let (create_schema, create_view) = Self::dataset_ddl(retailer)?;
        let drop_view = format!(
            "DROP VIEW IF EXISTS {}.{}",
            quote_ident(&retailer.dataset_name()),
            quote_ident(EVENTS_VIEW)
        );
        let mut tx = self.pool.begin().await?;
        for sql in [&create_schema, &drop_view, &create_view] {
            tracing::debug!(sql = %sql, "warehouse ddl");
            sqlx::query(sql).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl Warehouse for PgWarehouse {
    async fn table_exists(&self, dataset: &str, table: &str) -> Result<bool, WarehouseError> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM information_schema.tables WHERE table_schema = $1 AND table_name = $2)",
        )
        .bind(dataset)
        .bind(table)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists.0)
    }

    async fn create_dataset(&self, retailer: &RetailerConfig) -> Result<(), WarehouseError> {
        tracing::info!(retailer = %retailer.name, dataset = %retailer.dataset_name(), "creating dataset");
        self.rebuild_views(retailer).await
    }

    async fn update_dataset(&self, retailer: &RetailerConfig) -> Result<(), WarehouseError> {
        tracing::info!(retailer = %retailer.name, dataset = %retailer.dataset_name(), "updating dataset");
        self.rebuild_views(retailer).await
    }

    async fn drop_dataset(&self, retailer: &RetailerConfig) -> Result<(), WarehouseError> {
        let sql = format!("DROP SCHEMA IF EXISTS {} CASCADE", quote_ident(&retailer.dataset_name()));
        tracing::info!(retailer = %retailer.name, sql = %sql, "dropping dataset");
        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(())
    }

    async fn query(&self, sql: &str, params: &[QueryParam]) -> Result<QueryTable, WarehouseError> {
        tracing::debug!(sql = %sql, params = ?params, "warehouse query");
        let mut query = sqlx::query(sql);
        for p in params {
            query = p.bind_to(query);
        }
        let rows = query.fetch_all(&self.pool).await?;
        let columns: Vec<String> = match rows.first() {
            Some(row) => row.columns().iter().map(|c| c.name().to_string()).collect(),
            None => {
                // No row to read names from; describe with the same argument types that were bound.
                let types: Vec<PgTypeInfo> = params.iter().map(QueryParam::type_info).collect();
                let stmt = (&self.pool).prepare_with(sql, &types).await?;
                stmt.columns().iter().map(|c| c.name().to_string()).collect()
            }
        };
        let rows = rows
            .iter()
            .map(|r| (0..columns.len()).map(|i| cell_to_value(r, i)).collect())
            .collect();
        Ok(QueryTable { columns, rows })
    }

    async fn ping(&self) -> Result<(), WarehouseError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }
}

fn cell_to_value(row: &PgRow, idx: usize) -> Value {
    if let Ok(Some(n)) = row.try_get::<Option<i16>, _>(idx) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(idx) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(idx) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f32>, _>(idx) {
        if let Some(n) = serde_json::Number::from_f64(n as f64) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(idx) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(idx) {
        return Value::Bool(b);
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(idx) {
        return Value::String(d.format("%Y-%m-%d %H:%M:%S%:z").to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDateTime>, _>(idx) {
        return Value::String(d.format("%Y-%m-%d %H:%M:%S").to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDate>, _>(idx) {
        return Value::String(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(idx) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<Value>, _>(idx) {
        return j;
    }
    Value::Null
}
