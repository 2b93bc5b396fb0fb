use anyhow::anyhow;

use classconnect_auth::TokenError;
use classconnect_core::{AppError, HashError};
use classconnect_db::StoreError;
use classconnect_models::UserRole;

pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("User not found")]
    UserNotFound,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid user account configuration")]
    InvalidAccountConfiguration,

    #[error("This account is registered as a {registered}, not a {requested}")]
    RoleMismatch {
        registered: UserRole,
        requested: UserRole,
    },

    #[error("No account is registered with that email")]
    EmailNotFound,

    #[error("Email already registered")]
    EmailTaken,

    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Hashing(#[from] HashError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Label used for the login failure counter.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::UserNotFound => "user_not_found",
            AuthError::InvalidCredentials => "invalid_password",
            AuthError::InvalidAccountConfiguration => "invalid_account",
            AuthError::RoleMismatch { .. } => "role_mismatch",
            _ => "error",
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            // Indistinguishable to the client.
            AuthError::UserNotFound
            | AuthError::InvalidCredentials
            | AuthError::InvalidAccountConfiguration => {
                AppError::unauthorized(anyhow!(INVALID_CREDENTIALS))
            }
            AuthError::RoleMismatch { .. } => AppError::forbidden(anyhow!(err.to_string())),
            AuthError::EmailNotFound => AppError::not_found(anyhow!(err.to_string())),
            AuthError::EmailTaken => AppError::conflict(anyhow!(err.to_string())),
            AuthError::InvalidOrExpiredToken => AppError::bad_request(anyhow!(err.to_string())),
            AuthError::Token(e) => e.into(),
            AuthError::Hashing(e) => AppError::internal(e),
            AuthError::Store(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_credential_failures_share_one_message() {
        for err in [
            AuthError::UserNotFound,
            AuthError::InvalidCredentials,
            AuthError::InvalidAccountConfiguration,
        ] {
            let app = AppError::from(err);
            assert_eq!(app.status, StatusCode::UNAUTHORIZED);
            assert_eq!(app.public_message(), INVALID_CREDENTIALS);
        }
    }

    #[test]
    fn test_role_mismatch_names_registered_role() {
        let app = AppError::from(AuthError::RoleMismatch {
            registered: UserRole::Teacher,
            requested: UserRole::Student,
        });
        assert_eq!(app.status, StatusCode::FORBIDDEN);
        assert!(app.public_message().contains("registered as a teacher"));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::from(AuthError::EmailTaken).status,
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(AuthError::InvalidOrExpiredToken).status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(AuthError::Token(TokenError::Expired)).status,
            StatusCode::UNAUTHORIZED
        );
    }
}
