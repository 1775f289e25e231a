//! Oneshot helpers for handler tests.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use migration::{Migrator, MigratorTrait};
use platform_db::{DatabaseSettings, DbPool, connect};
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::{
    config::AppConfig,
    http::{AppState, build_router},
};

pub async fn app() -> (Router, DbPool) {
    let pool = connect(&DatabaseSettings::sqlite_memory()).await.unwrap();
    Migrator::up(&pool, None).await.unwrap();
    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(AppConfig::default()),
    };
    (build_router(state), pool)
}

pub async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

pub fn new_deal(name: &str) -> Value {
    json!({
        "companyName": name,
        "sector": "Fintech",
        "stage": "term_sheet",
        "requestedAmount": "1500000",
        "valuation": "12000000.50",
        "roundStage": "Series A",
        "teamScore": 7,
        "productScore": 6,
        "marketScore": 8,
        "tractionScore": 5,
        "founderName": "Ada",
        "founderEmail": "ada@example.com",
        "notes": ""
    })
}

pub async fn create(app: &Router, name: &str) -> i64 {
    let (status, body) = call(app, Method::POST, "/api/deals", Some(new_deal(name))).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
}
