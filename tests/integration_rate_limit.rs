mod common;

use axum::http::StatusCode;
use classconnect_config::{RateLimitConfig, RateLimitRule};
use common::{register_teacher, send, setup_test_app, setup_test_app_with_rate_limit};
use serde_json::json;

/// One auth request and two general requests per peer before the bucket runs dry.
fn strict_rate_limit_config() -> RateLimitConfig {
    RateLimitConfig {
        enabled: true,
        general: RateLimitRule::new(60, 2),
        auth: RateLimitRule::new(60, 1),
    }
}

fn login_body() -> serde_json::Value {
    json!({ "email": "test@example.com", "password": "password123" })
}

#[tokio::test]
async fn test_auth_rate_limit_exceeded() {
    let app = setup_test_app_with_rate_limit(strict_rate_limit_config());

    let (status, _) = send(&app, "POST", "/api/auth/login", None, Some(login_body())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "POST", "/api/auth/login", None, Some(login_body())).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_general_rate_limit_exceeded() {
    let app = setup_test_app_with_rate_limit(strict_rate_limit_config());

    for _ in 0..2 {
        let (status, _) = send(&app, "GET", "/api/classes", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, _) = send(&app, "GET", "/api/classes", None, None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_health_is_not_rate_limited() {
    let app = setup_test_app_with_rate_limit(strict_rate_limit_config());

    for _ in 0..5 {
        let (status, body) = send(&app, "GET", "/ping", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "pong");
    }
}

#[tokio::test]
async fn test_disabled_rate_limit_allows_bursts() {
    let app = setup_test_app();
    let teacher = register_teacher(&app, "Ada").await;

    for _ in 0..20 {
        let (status, _) = send(&app, "GET", "/api/classes", Some(&teacher.token), None).await;
        assert_eq!(status, StatusCode::OK);
    }
}
