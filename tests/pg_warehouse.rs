//! Runs against a live PostgreSQL when `DATABASE_URL` is set; otherwise each test returns early.

use coop_conversions::{
    ConversionService, CoopCampaignConfig, CoopWithRetailer, PgWarehouse, QueryParam, RetailerConfig, Warehouse,
};
use serde_json::json;
use sqlx::PgPool;
use std::time::{SystemTime, UNIX_EPOCH};

async fn pool() -> Option<PgPool> {
    let url = std::env::var("DATABASE_URL").ok()?;
    Some(PgPool::connect(&url).await.unwrap())
}

fn unique(prefix: &str) -> String {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().subsec_nanos();
    format!("{}_{}_{}", prefix, std::process::id(), nanos)
}

async fn exec(pool: &PgPool, sql: &str) {
    sqlx::query(sql).execute(pool).await.unwrap();
}

#[tokio::test]
async fn query_binds_match_declared_types_across_calls() {
    let Some(pool) = pool().await else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };
    let warehouse = PgWarehouse::new(pool);
    let sql = r#"SELECT $1::int8 AS "Window_Days", $2::text AS "Label" WHERE $3::bool"#;

    let empty = warehouse
        .query(sql, &[QueryParam::I64(5), "x".into(), QueryParam::Bool(false)])
        .await
        .unwrap();
    assert_eq!(empty.columns, vec!["Window_Days", "Label"]);
    assert!(empty.rows.is_empty());

    let one = warehouse
        .query(sql, &[QueryParam::I64(5), "x".into(), QueryParam::Bool(true)])
        .await
        .unwrap();
    assert_eq!(one.columns, vec!["Window_Days", "Label"]);
    assert_eq!(one.rows, vec![vec![json!(5), json!("x")]]);
}

#[tokio::test]
async fn conversions_export_reads_the_retailer_events_view() {
    let Some(pool) = pool().await else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };
    let source = unique("analytics");
    let name = unique("shop");
    exec(&pool, &format!(r#"CREATE SCHEMA "{}""#, source)).await;
    exec(
        &pool,
        &format!(
            r#"CREATE TABLE "{}".ga_events (
                event_timestamp TIMESTAMPTZ NOT NULL,
                event_name TEXT NOT NULL,
                gclid TEXT,
                utm_campaign TEXT,
                value NUMERIC
            )"#,
            source
        ),
    )
    .await;
    exec(
        &pool,
        &format!(
            r#"INSERT INTO "{}".ga_events VALUES
                (NOW() - INTERVAL '1 day', 'purchase', 'abc', 'spring_sale', 12.5),
                (NOW() - INTERVAL '1 day', 'purchase', 'def', 'other_sale', 3),
                (NOW() - INTERVAL '20 days', 'purchase', 'old', 'spring_sale', 4),
                (NOW() - INTERVAL '1 day', 'page_view', 'ghi', 'spring_sale', NULL)"#,
            source
        ),
    )
    .await;

    let retailer: RetailerConfig = serde_json::from_value(json!({
        "name": name,
        "ga_table": format!("{}.ga_events", source),
        "currency": "EUR"
    }))
    .unwrap();
    let coop: CoopCampaignConfig = serde_json::from_value(json!({
        "name": "spring",
        "retailer_name": name,
        "utm_campaigns": ["spring_sale"],
        "conversion_name": "Coop Purchase",
        "attribution_window_days": 7
    }))
    .unwrap();

    let warehouse = PgWarehouse::new(pool.clone());
    assert!(warehouse.table_exists(&source, "ga_events").await.unwrap());
    warehouse.create_dataset(&retailer).await.unwrap();

    let config = CoopWithRetailer { coop, retailer: retailer.clone() };
    let service = ConversionService::new(&warehouse, &config);
    for _ in 0..2 {
        let csv = service.get_conversions().await;
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "Google Click ID,Conversion Name,Conversion Time,Conversion Value,Conversion Currency"
        );
        assert_eq!(lines.len(), 2, "unexpected export: {csv:?}");
        assert!(lines[1].starts_with("abc,Coop Purchase,"));
        assert!(lines[1].ends_with(",12.5,EUR"));
    }

    warehouse.drop_dataset(&retailer).await.unwrap();
    assert!(warehouse.table_exists(&source, "ga_events").await.unwrap());
    exec(&pool, &format!(r#"DROP SCHEMA "{}" CASCADE"#, source)).await;
}
