//! The request gate: bearer header, token verification and role checks.

use anyhow::anyhow;
use axum::http::{HeaderMap, header};
use chrono::{DateTime, Utc};

use classconnect_config::JwtConfig;
use classconnect_core::AppError;
use classconnect_models::UserRole;

use crate::claims::Claims;
use crate::token::{TokenError, verify};

/// Identity of the caller, attached to the request once the token verifies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: i64,
    pub email: String,
    pub role: UserRole,
}

impl AuthContext {
    pub fn is_teacher(&self) -> bool {
        self.role == UserRole::Teacher
    }

    pub fn is_student(&self) -> bool {
        self.role == UserRole::Student
    }
}

impl From<Claims> for AuthContext {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
            role: claims.role,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("Missing authorization header")]
    MissingHeader,

    #[error("Invalid authorization header format")]
    MalformedHeader,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("Access denied: requires role {}", format_roles(.allowed))]
    Forbidden { allowed: Vec<UserRole> },
}

fn format_roles(roles: &[UserRole]) -> String {
    roles
        .iter()
        .map(UserRole::as_str)
        .collect::<Vec<_>>()
        .join(" or ")
}

impl From<AccessError> for AppError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::MissingHeader | AccessError::MalformedHeader => {
                AppError::unauthorized(anyhow!(err.to_string()))
            }
            AccessError::Token(e) => e.into(),
            AccessError::Forbidden { .. } => AppError::forbidden(anyhow!(err.to_string())),
        }
    }
}

/// Splits `Bearer <token>`. Exactly two space-separated parts are accepted.
pub fn parse_bearer(value: &str) -> Result<&str, AccessError> {
    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(AccessError::MalformedHeader),
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AccessError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AccessError::MissingHeader)?
        .to_str()
        .map_err(|_| AccessError::MalformedHeader)?;
    parse_bearer(value)
}

/// Runs the whole first stage of the gate against request headers.
pub fn authenticate(
    headers: &HeaderMap,
    now: DateTime<Utc>,
    jwt_config: &JwtConfig,
) -> Result<AuthContext, AccessError> {
    let token = bearer_token(headers)?;
    let claims = verify(token, now, jwt_config)?;
    Ok(claims.into())
}

/// Second stage: the caller's role must be in `allowed`.
pub fn check_role(ctx: &AuthContext, allowed: &[UserRole]) -> Result<(), AccessError> {
    if allowed.contains(&ctx.role) {
        Ok(())
    } else {
        Err(AccessError::Forbidden {
            allowed: allowed.to_vec(),
        })
    }
}
