//! Config tables DDL and PostgreSQL-backed [`ConfigStore`]. Tables live in the schema named by `COOP_SCHEMA` (default `coop`).

use super::ConfigStore;
use crate::error::{ConfigError, StoreError};
use crate::models::{CoopCampaignConfig, RetailerConfig};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::ConnectOptions;
use sqlx::PgPool;
use std::str::FromStr;

const RETAILERS_TABLE: &str = "retailer_configs";
const COOPS_TABLE: &str = "coop_configs";

type Row = (String, Value, DateTime<Utc>, DateTime<Utc>);

/// Create the config schema if not exists, then the retailer and co-op tables.
pub async fn ensure_config_tables(pool: &PgPool, schema: &str) -> Result<(), ConfigError> {
    let schema = quote_ident(schema);
    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", schema))
        .execute(pool)
        .await?;

    let retailers_ddl = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {}.{} (
            name TEXT PRIMARY KEY,
            payload JSONB NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
        schema, RETAILERS_TABLE
    );
    sqlx::query(&retailers_ddl).execute(pool).await?;

    let coops_ddl = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {}.{} (
            name TEXT PRIMARY KEY,
            retailer_name TEXT NOT NULL,
            payload JSONB NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
        schema, COOPS_TABLE
    );
    sqlx::query(&coops_ddl).execute(pool).await?;
    let index_ddl = format!(
        "CREATE INDEX IF NOT EXISTS coop_configs_retailer_name_idx ON {}.{} (retailer_name)",
        schema, COOPS_TABLE
    );
    sqlx::query(&index_ddl).execute(pool).await?;
    Ok(())
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), ConfigError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| ConfigError::DatabaseUrl(e.to_string()))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), ConfigError> {
    let path_start = url
        .rfind('/')
        .ok_or_else(|| ConfigError::DatabaseUrl("no path".into()))?
        + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres", base), db_name.to_string()))
}

pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Store payload: the record minus the columns the table owns.
fn to_payload<T: serde::Serialize>(config: &T) -> Result<Value, StoreError> {
    let mut v = serde_json::to_value(config).map_err(|source| StoreError::Payload {
        name: String::new(),
        source,
    })?;
    if let Value::Object(m) = &mut v {
        m.remove("created_at");
        m.remove("updated_at");
    }
    Ok(v)
}

fn from_row<T: serde::de::DeserializeOwned>(row: Row) -> Result<T, StoreError> {
    let (name, mut payload, created_at, updated_at) = row;
    if let Value::Object(m) = &mut payload {
        m.insert("name".into(), Value::String(name.clone()));
        m.insert("created_at".into(), Value::String(created_at.to_rfc3339()));
        m.insert("updated_at".into(), Value::String(updated_at.to_rfc3339()));
    }
    serde_json::from_value(payload).map_err(|source| StoreError::Payload { name, source })
}

#[derive(Clone)]
pub struct PgConfigStore {
    pool: PgPool,
    retailers: String,
    coops: String,
}

impl PgConfigStore {
    pub fn new(pool: PgPool, schema: &str) -> Self {
        let schema = quote_ident(schema);
        PgConfigStore {
            pool,
            retailers: format!("{}.{}", schema, RETAILERS_TABLE),
            coops: format!("{}.{}", schema, COOPS_TABLE),
        }
    }

    async fn fetch_one_row(&self, table: &str, name: &str) -> Result<Option<Row>, StoreError> {
        let sql = format!(
            "SELECT name, payload, created_at, updated_at FROM {} WHERE name = $1",
            table
        );
        tracing::debug!(sql = %sql, name, "query");
        Ok(sqlx::query_as(&sql).bind(name).fetch_optional(&self.pool).await?)
    }

    async fn insert_row(
        &self,
        sql: &str,
        name: &str,
        extra: Option<&str>,
        payload: &Value,
    ) -> Result<Option<Row>, StoreError> {
        tracing::debug!(sql = %sql, name, "insert");
        let mut q = sqlx::query_as::<_, Row>(sql).bind(name);
        if let Some(e) = extra {
            q = q.bind(e);
        }
        Ok(q.bind(payload).fetch_optional(&self.pool).await?)
    }

    async fn delete_row(&self, table: &str, name: &str) -> Result<bool, StoreError> {
        let sql = format!("DELETE FROM {} WHERE name = $1", table);
        tracing::debug!(sql = %sql, name, "delete");
        let res = sqlx::query(&sql).bind(name).execute(&self.pool).await?;
        Ok(res.rows_affected() > 0)
    }
}

#[async_trait]
impl ConfigStore for PgConfigStore {
    async fn list_retailers(&self) -> Result<Vec<RetailerConfig>, StoreError> {
        let sql = format!(
            "SELECT name, payload, created_at, updated_at FROM {} ORDER BY name",
            self.retailers
        );
        let rows: Vec<Row> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(from_row).collect()
    }

    async fn get_retailer(&self, name: &str) -> Result<Option<RetailerConfig>, StoreError> {
        self.fetch_one_row(&self.retailers, name).await?.map(from_row).transpose()
    }

    async fn insert_retailer(&self, config: &RetailerConfig) -> Result<RetailerConfig, StoreError> {
        let sql = format!(
            "INSERT INTO {} (name, payload) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING \
             RETURNING name, payload, created_at, updated_at",
            self.retailers
        );
        let payload = to_payload(config)?;
        self.insert_row(&sql, &config.name, None, &payload)
            .await?
            .map(from_row)
            .transpose()?
            .ok_or_else(|| StoreError::Duplicate(config.name.clone()))
    }

    async fn update_retailer(&self, name: &str, config: &RetailerConfig) -> Result<Option<RetailerConfig>, StoreError> {
        let sql = format!(
            "UPDATE {} SET payload = $2, updated_at = NOW() WHERE name = $1 \
             RETURNING name, payload, created_at, updated_at",
            self.retailers
        );
        let row: Option<Row> = sqlx::query_as(&sql)
            .bind(name)
            .bind(to_payload(config)?)
            .fetch_optional(&self.pool)
            .await?;
        row.map(from_row).transpose()
    }

    async fn restore_retailer(&self, config: &RetailerConfig) -> Result<(), StoreError> {
        let sql = format!(
            "INSERT INTO {} (name, payload, created_at, updated_at) \
             VALUES ($1, $2, COALESCE($3, NOW()), COALESCE($4, NOW())) \
             ON CONFLICT (name) DO UPDATE SET payload = EXCLUDED.payload, \
             created_at = EXCLUDED.created_at, updated_at = EXCLUDED.updated_at",
            self.retailers
        );
        sqlx::query(&sql)
            .bind(&config.name)
            .bind(to_payload(config)?)
            .bind(config.created_at)
            .bind(config.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_retailer(&self, name: &str) -> Result<bool, StoreError> {
        self.delete_row(&self.retailers, name).await
    }

    async fn list_coops(&self, retailer_name: Option<&str>) -> Result<Vec<CoopCampaignConfig>, StoreError> {
        let rows: Vec<Row> = match retailer_name {
            Some(r) => {
                let sql = format!(
                    "SELECT name, payload, created_at, updated_at FROM {} WHERE retailer_name = $1 ORDER BY name",
                    self.coops
                );
                sqlx::query_as(&sql).bind(r).fetch_all(&self.pool).await?
            }
            None => {
                let sql = format!(
                    "SELECT name, payload, created_at, updated_at FROM {} ORDER BY name",
                    self.coops
                );
                sqlx::query_as(&sql).fetch_all(&self.pool).await?
            }
        };
        rows.into_iter().map(from_row).collect()
    }

    async fn get_coop(&self, name: &str) -> Result<Option<CoopCampaignConfig>, StoreError> {
        self.fetch_one_row(&self.coops, name).await?.map(from_row).transpose()
    }

    async fn insert_coop(&self, config: &CoopCampaignConfig) -> Result<CoopCampaignConfig, StoreError> {
        let sql = format!(
            "INSERT INTO {} (name, retailer_name, payload) VALUES ($1, $2, $3) ON CONFLICT (name) DO NOTHING \
             RETURNING name, payload, created_at, updated_at",
            self.coops
        );
        let payload = to_payload(config)?;
        self.insert_row(&sql, &config.name, Some(&config.retailer_name), &payload)
            .await?
            .map(from_row)
            .transpose()?
            .ok_or_else(|| StoreError::Duplicate(config.name.clone()))
    }

    async fn update_coop(&self, name: &str, config: &CoopCampaignConfig) -> Result<Option<CoopCampaignConfig>, StoreError> {
        let sql = format!(
            "UPDATE {} SET retailer_name = $2, payload = $3, updated_at = NOW() WHERE name = $1 \
             RETURNING name, payload, created_at, updated_at",
            self.coops
        );
        let row: Option<Row> = sqlx::query_as(&sql)
            .bind(name)
            .bind(&config.retailer_name)
            .bind(to_payload(config)?)
            .fetch_optional(&self.pool)
            .await?;
        row.map(from_row).transpose()
    }

    async fn delete_coop(&self, name: &str) -> Result<bool, StoreError> {
        self.delete_row(&self.coops, name).await
    }

    async fn delete_coops_by_retailer(&self, retailer_name: &str) -> Result<u64, StoreError> {
        let sql = format!("DELETE FROM {} WHERE retailer_name = $1", self.coops);
        tracing::debug!(sql = %sql, retailer_name, "delete");
        let res = sqlx::query(&sql).bind(retailer_name).execute(&self.pool).await?;
        Ok(res.rows_affected())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn db_name_is_split_from_url() {
        let (admin, db) = parse_db_name_from_url("postgres://u:p@localhost:5432/coop?sslmode=disable").unwrap();
        assert_eq!(admin, "postgres://u:p@localhost:5432/postgres");
        assert_eq!(db, "coop");
    }

    #[test]
    fn identifiers_are_quoted() {
        assert_eq!(quote_ident("coop"), "\"coop\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn payload_drops_timestamps_and_row_restores_them() {
        let r: RetailerConfig = serde_json::from_value(json!({
            "name": "acme",
            "ga_table": "a.b",
            "created_at": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        let payload = to_payload(&r).unwrap();
        assert!(payload.get("created_at").is_none());

        let ts = Utc::now();
        let back: RetailerConfig = from_row(("acme".into(), payload, ts, ts)).unwrap();
        assert_eq!(back.created_at, Some(ts));
        assert_eq!(back.ga_table, "a.b");
    }
}
