//! HS256 access tokens.
//!
//! Both functions take `now` explicitly so expiry is decided by the caller's
//! clock, not by the JWT library.

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};

use classconnect_config::JwtConfig;
use classconnect_core::AppError;
use classconnect_models::UserRole;

use crate::claims::Claims;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Failed to sign token: {0}")]
    Signing(String),

    #[error("Token signing secret is not configured")]
    MissingSecret,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token has expired")]
    Expired,

    #[error("Malformed token: {0}")]
    Malformed(String),
}

impl TokenError {
    pub fn is_server_fault(&self) -> bool {
        matches!(self, TokenError::Signing(_) | TokenError::MissingSecret)
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(_) | TokenError::MissingSecret => AppError::internal(err),
            TokenError::Expired => AppError::unauthorized(anyhow!("Token has expired")),
            TokenError::InvalidSignature | TokenError::Malformed(_) => {
                AppError::unauthorized(anyhow!("Invalid token"))
            }
        }
    }
}

/// Signs `{userId, email, role, exp = now + TTL}`.
pub fn issue(
    user_id: i64,
    email: &str,
    role: UserRole,
    now: DateTime<Utc>,
    jwt_config: &JwtConfig,
) -> Result<String, TokenError> {
    if jwt_config.secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }

    let claims = Claims::new(
        user_id,
        email,
        role,
        now.timestamp() + jwt_config.access_token_expiry,
    );

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| TokenError::Signing(e.to_string()))
}

/// Checks the signature, then the claim shape, then `exp > now`.
pub fn verify(
    token: &str,
    now: DateTime<Utc>,
    jwt_config: &JwtConfig,
) -> Result<Claims, TokenError> {
    if jwt_config.secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp"]);

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        _ => TokenError::Malformed(e.to_string()),
    })?;

    if claims.is_expired_at(now) {
        return Err(TokenError::Expired);
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use chrono::Duration;

    fn config() -> JwtConfig {
        JwtConfig::new("test-secret-key-at-least-32-characters-long", 3600)
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_704_067_200, 0).unwrap()
    }

    #[test]
    fn test_issue_then_verify() {
        let token = issue(5, "t@example.com", UserRole::Teacher, now(), &config()).unwrap();
        let claims = verify(&token, now(), &config()).unwrap();

        assert_eq!(claims.user_id, 5);
        assert_eq!(claims.email, "t@example.com");
        assert_eq!(claims.role, UserRole::Teacher);
        assert_eq!(claims.exp, now().timestamp() + 3600);
    }

    #[test]
    fn test_verify_at_expiry_boundary() {
        let token = issue(5, "t@example.com", UserRole::Student, now(), &config()).unwrap();

        let just_before = now() + Duration::seconds(3599);
        assert!(verify(&token, just_before, &config()).is_ok());

        let at_exp = now() + Duration::seconds(3600);
        assert!(matches!(
            verify(&token, at_exp, &config()),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_verify_wrong_secret() {
        let token = issue(5, "t@example.com", UserRole::Student, now(), &config()).unwrap();
        let other = JwtConfig::new("another-secret-key-at-least-32-characters", 3600);
        assert!(matches!(
            verify(&token, now(), &other),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn test_verify_rejects_tampered_signature() {
        let token = issue(5, "t@example.com", UserRole::Student, now(), &config()).unwrap();
        let (head, signature) = token.rsplit_once('.').unwrap();

        let mut bytes = signature.as_bytes().to_vec();
        bytes[0] = if bytes[0] == b'A' { b'B' } else { b'A' };
        let tampered = format!("{head}.{}", String::from_utf8(bytes).unwrap());

        assert!(verify(&tampered, now(), &config()).is_err());
    }

    #[test]
    fn test_verify_garbage_is_malformed() {
        assert!(matches!(
            verify("not-a-token", now(), &config()),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn test_empty_secret_is_rejected() {
        let empty = JwtConfig::new("", 3600);
        assert!(matches!(
            issue(1, "a@b.c", UserRole::Student, now(), &empty),
            Err(TokenError::MissingSecret)
        ));
    }

    #[test]
    fn test_token_error_status_mapping() {
        assert_eq!(
            AppError::from(TokenError::Expired).status,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(TokenError::MissingSecret).status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert!(TokenError::Signing("x".into()).is_server_fault());
    }
}
