#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use classconnect::router::init_router;
use classconnect::state::AppState;
use classconnect_config::{JwtConfig, RateLimitConfig};
use classconnect_core::{MIN_COST, PasswordHasher};
use classconnect_db::MemoryStore;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &str = "integration-test-secret";
pub const TEST_PASSWORD: &str = "password123";

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig::new(TEST_JWT_SECRET, 3600)
}

/// A fresh in-memory app. Every call starts from an empty store.
pub fn setup_test_app() -> Router {
    setup_test_app_with_rate_limit(RateLimitConfig::disabled())
}

pub fn setup_test_app_with_rate_limit(rate_limit_config: RateLimitConfig) -> Router {
    let state = AppState::new(
        Arc::new(MemoryStore::new()),
        test_jwt_config(),
        PasswordHasher::new(MIN_COST),
    )
    .with_rate_limit_config(rate_limit_config);
    init_router(state)
}

pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub token: String,
}

/// Sends one request and returns the status with the JSON body
/// (`Value::Null` when the body is empty or not JSON).
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).unwrap())
        }
        None => Body::empty(),
    };

    let mut request = builder.body(body).unwrap();
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub fn generate_unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@test.com", rand::random::<u32>())
}

pub async fn register(app: &Router, role: &str, first_name: &str) -> TestUser {
    let email = generate_unique_email(first_name);
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "email": email,
            "password": TEST_PASSWORD,
            "firstName": first_name,
            "lastName": "Tester",
            "role": role
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");

    TestUser {
        id: body["user"]["id"].as_i64().unwrap(),
        email: body["user"]["email"].as_str().unwrap().to_string(),
        token: body["token"].as_str().unwrap().to_string(),
    }
}

pub async fn register_teacher(app: &Router, first_name: &str) -> TestUser {
    register(app, "teacher", first_name).await
}

pub async fn register_student(app: &Router, first_name: &str) -> TestUser {
    register(app, "student", first_name).await
}

/// Creates a class as `teacher` and returns `(id, code)`.
pub async fn create_class(app: &Router, teacher: &TestUser, name: &str) -> (i64, String) {
    let (status, body) = send(
        app,
        "POST",
        "/api/classes",
        Some(&teacher.token),
        Some(json!({ "className": name, "subject": "Math" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create class failed: {body}");
    (
        body["id"].as_i64().unwrap(),
        body["classCode"].as_str().unwrap().to_string(),
    )
}

pub async fn join_class(app: &Router, student: &TestUser, code: &str) {
    let (status, body) = send(
        app,
        "POST",
        "/api/classes/join",
        Some(&student.token),
        Some(json!({ "classCode": code })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "join failed: {body}");
}
