mod common;

use axum::http::{Method, StatusCode};
use common::test_app;

#[tokio::test]
async fn health_and_ready() {
    let app = test_app();
    let res = app.send(Method::GET, "/health", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["status"], "ok");

    let res = app.send(Method::GET, "/ready", None).await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["store"], "ok");
    assert_eq!(body["warehouse"], "ok");
}

#[tokio::test]
async fn ready_is_503_when_warehouse_is_down() {
    let app = test_app();
    app.warehouse.fail_ping(true);
    let res = app.send(Method::GET, "/ready", None).await;
    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);
    let body = res.json();
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["store"], "ok");
    assert_eq!(body["warehouse"], "unavailable");

    let res = app.send(Method::GET, "/health", None).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn version_and_openapi() {
    let app = test_app();
    let res = app.send(Method::GET, "/version", None).await;
    assert_eq!(res.json()["name"], "coop-conversions");

    let res = app.send(Method::GET, "/openapi.json", None).await;
    assert_eq!(res.status, StatusCode::OK);
    let schemas = &res.json()["components"]["schemas"];
    assert!(schemas.get("RetailerConfig").is_some());
    assert!(schemas.get("CoopCampaignConfig").is_some());
}
