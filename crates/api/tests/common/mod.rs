#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, Response};
use http_body_util::BodyExt;
use pathway_api::auth::{JwtConfig, issue_token};
use pathway_api::config::ServerConfig;
use pathway_api::router::build_app_router;
use pathway_api::state::AppState;
use pathway_core::Catalog;
use pathway_core::time::fixed_clock;
use services::{AppServices, ChatRelay, DeploymentMode};
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret";

/// Test `ServerConfig` with the dev CORS origin and a fixed signing secret.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: "sqlite::memory:".to_string(),
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            token_ttl_mins: 60,
        },
        catalog_path: None,
    }
}

/// Full router over in-memory storage, answering chat with the mock plan.
pub fn build_test_app() -> Router {
    build_app_with_relay(ChatRelay::new(None, DeploymentMode::Development))
}

pub fn build_app_with_relay(relay: ChatRelay) -> Router {
    let config = test_config();
    let catalog = Catalog::builtin().unwrap();
    let services = AppServices::in_memory(fixed_clock(), catalog, relay);
    let state = AppState {
        services,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

/// Router over a `SQLite` database at `db_url`.
pub async fn build_sqlite_app(db_url: &str) -> Router {
    let config = test_config();
    let services = AppServices::new_sqlite(
        db_url,
        fixed_clock(),
        Catalog::builtin().unwrap(),
        ChatRelay::new(None, DeploymentMode::Development),
    )
    .await
    .unwrap();
    let state = AppState {
        services,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

pub fn bearer(user_id: &str) -> String {
    let token = issue_token(user_id, &test_config().jwt).unwrap();
    format!("Bearer {token}")
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, user_id: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(bearer(user_id)), None).await
}

pub async fn post_json(app: Router, uri: &str, body: &serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(body.to_string())).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    user_id: &str,
    body: &serde_json::Value,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(bearer(user_id)), Some(body.to_string())).await
}

pub async fn post_raw_auth(app: Router, uri: &str, user_id: &str, raw: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(bearer(user_id)), Some(raw.to_string())).await
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    auth: Option<String>,
    body: Option<String>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(AUTHORIZATION, auth);
    }
    let request = match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
