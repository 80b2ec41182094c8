//! Helpers for in-process router tests against the in-memory store.

use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::app::build_app;
use crate::state::AppState;
use crate::store::Role;

pub const TEST_PASSWORD: &str = "Passw0rd!";

pub fn test_app() -> (Router, AppState) {
    let state = AppState::for_tests();
    (build_app(state.clone()), state)
}

pub async fn post_raw(
    app: &Router,
    uri: &str,
    bearer: Option<&str>,
    body: Value,
) -> Response<Body> {
    let mut request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = bearer {
        request = request.header("authorization", format!("Bearer {token}"));
    }
    let request = request
        .body(Body::from(serde_json::to_vec(&body).expect("encode body")))
        .expect("build request");
    app.clone().oneshot(request).await.expect("send request")
}

/// POST with an explicit forwarded client address, for throttle tests.
pub async fn post_raw_from(app: &Router, uri: &str, client: &str, body: Value) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-forwarded-for", client)
        .body(Body::from(serde_json::to_vec(&body).expect("encode body")))
        .expect("build request");
    app.clone().oneshot(request).await.expect("send request")
}

pub async fn post(
    app: &Router,
    uri: &str,
    bearer: Option<&str>,
    body: Value,
) -> (StatusCode, Value) {
    let response = post_raw(app, uri, bearer, body).await;
    let status = response.status();
    (status, body_json(response).await)
}

pub async fn get(app: &Router, uri: &str, bearer: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::builder().method("GET").uri(uri);
    if let Some(token) = bearer {
        request = request.header("authorization", format!("Bearer {token}"));
    }
    let request = request.body(Body::empty()).expect("build request");
    let response = app.clone().oneshot(request).await.expect("send request");
    let status = response.status();
    (status, body_json(response).await)
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

/// Registers a user and returns a fresh login token. Each call comes from a
/// unique forwarded address so helper traffic never trips the throttles
/// under test.
pub async fn register_and_login(app: &Router, email: &str) -> String {
    let client = format!("198.51.100.{}", (email.len() * 7) % 250 + 1);
    let response = post_raw_from(
        app,
        "/api/auth/register",
        &client,
        json!({"email": email, "password": TEST_PASSWORD}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED, "register {email}");

    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header("content-type", "application/json")
        .header("x-forwarded-for", client)
        .body(Body::from(
            serde_json::to_vec(&json!({"email": email, "password": TEST_PASSWORD}))
                .expect("encode body"),
        ))
        .expect("build request");
    let response = app.clone().oneshot(request).await.expect("send request");
    assert_eq!(response.status(), StatusCode::OK, "login {email}");
    let body = body_json(response).await;
    body["token"].as_str().expect("token").to_string()
}

/// Promotes an existing user to admin directly in the store.
pub async fn make_admin(state: &AppState, email: &str) {
    let mut user = state
        .store
        .find_user_by_email(email)
        .await
        .expect("store")
        .expect("user exists");
    user.role = Role::Admin;
    state.store.upsert_user(&user).await.expect("store");
}
