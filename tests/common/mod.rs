//! Shared helpers for the HTTP integration tests.

#![allow(dead_code, clippy::panic, clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, Response, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use slotswap_gateway::api::build_app;
use slotswap_gateway::app_state::AppState;
use slotswap_gateway::auth::{Claims, JwtAuthProvider};
use slotswap_gateway::domain::EventBus;
use slotswap_gateway::persistence::MemoryStore;

pub const SECRET: &str = "integration-test-secret";

/// Full application over an empty in-memory store.
pub fn build_test_app() -> Router {
    let state = AppState::new(
        Arc::new(MemoryStore::new()),
        EventBus::new(256),
        Arc::new(JwtAuthProvider::new(SECRET)),
    );
    build_app(state)
}

/// A fresh user id and a valid bearer token for it.
pub fn new_user() -> (Uuid, String) {
    let sub = Uuid::new_v4();
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub,
        exp: now + 3600,
        iat: now,
    };
    let token = JwtAuthProvider::issue(SECRET, &claims).expect("token should encode");
    (sub, token)
}

/// Sends one request through the router.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
}

/// Collects a response body as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("response body should be JSON")
}

/// Creates a slot for `token` and returns its id.
pub async fn create_slot(app: &Router, token: &str, title: &str, status: &str) -> String {
    let response = send(
        app,
        Method::POST,
        "/api/v1/slots",
        Some(token),
        Some(serde_json::json!({
            "title": title,
            "startTime": "2030-05-01T09:00:00Z",
            "endTime": "2030-05-01T10:00:00Z",
            "status": status,
        })),
    )
    .await;
    assert_eq!(response.status(), 201);
    body_json(response).await["id"]
        .as_str()
        .expect("slot id")
        .to_string()
}
