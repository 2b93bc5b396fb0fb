use chrono::{Duration, TimeZone, Utc};
use classconnect_auth::{TokenError, issue, verify};
use classconnect_config::{Environment, JwtConfig};
use classconnect_models::UserRole;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;

fn config() -> JwtConfig {
    JwtConfig::new("unit-test-secret", 3600)
}

#[test]
fn test_issue_and_verify_round_trip() {
    let now = Utc::now();
    let token = issue(42, "ada@test.com", UserRole::Teacher, now, &config()).unwrap();

    let claims = verify(&token, now, &config()).unwrap();
    assert_eq!(claims.user_id, 42);
    assert_eq!(claims.email, "ada@test.com");
    assert_eq!(claims.role, UserRole::Teacher);
    assert_eq!(claims.exp, now.timestamp() + 3600);
}

#[test]
fn test_token_expires_after_ttl() {
    let issued_at = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
    let token = issue(7, "sam@test.com", UserRole::Student, issued_at, &config()).unwrap();

    assert!(verify(&token, issued_at + Duration::minutes(59), &config()).is_ok());
    assert!(matches!(
        verify(&token, issued_at + Duration::hours(2), &config()),
        Err(TokenError::Expired)
    ));
}

#[test]
fn test_wrong_secret_is_rejected() {
    let now = Utc::now();
    let token = issue(1, "a@test.com", UserRole::Student, now, &config()).unwrap();
    let other = JwtConfig::new("another-secret", 3600);

    assert!(matches!(
        verify(&token, now, &other),
        Err(TokenError::InvalidSignature)
    ));
}

#[test]
fn test_garbage_and_incomplete_tokens_are_malformed() {
    let now = Utc::now();
    assert!(matches!(
        verify("not-a-token", now, &config()),
        Err(TokenError::Malformed(_))
    ));

    let missing_role = encode(
        &Header::default(),
        &json!({ "userId": 1, "email": "a@test.com", "exp": now.timestamp() + 60 }),
        &EncodingKey::from_secret(b"unit-test-secret"),
    )
    .unwrap();
    assert!(matches!(
        verify(&missing_role, now, &config()),
        Err(TokenError::Malformed(_))
    ));
}

#[test]
fn test_empty_secret_is_a_server_fault() {
    let empty = JwtConfig::new("", 3600);
    let err = issue(1, "a@test.com", UserRole::Teacher, Utc::now(), &empty).unwrap_err();
    assert!(err.is_server_fault());
}

#[test]
fn test_missing_secret_only_allowed_in_development() {
    let dev = JwtConfig::resolve(None, None, Environment::Development).unwrap();
    assert!(dev.uses_dev_secret());

    assert!(JwtConfig::resolve(None, None, Environment::Production).is_err());
}
