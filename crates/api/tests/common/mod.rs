#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::FixedOffset;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use gigboard_api::config::ServerConfig;
use gigboard_api::router::build_app_router;
use gigboard_api::state::AppState;
use gigboard_core::known_venues::{KnownVenue, KnownVenues};

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
    }
}

/// Build the full application router over `pool`, with Valley Bar as the
/// only known venue and Arizona time.
pub fn build_test_app(pool: PgPool) -> Router {
    let known = KnownVenues::from_entries(vec![KnownVenue {
        key: "valley-bar".to_string(),
        name: "Valley Bar".to_string(),
        city: "Phoenix".to_string(),
        state: "AZ".to_string(),
    }]);
    let state = AppState {
        pool,
        known_venues: Arc::new(known),
        utc_offset: FixedOffset::west_opt(7 * 3600).unwrap(),
    };
    build_app_router(state, &test_config())
}

/// Base64-encode a document body.
pub fn encode(text: &str) -> String {
    STANDARD.encode(text)
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_empty(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
