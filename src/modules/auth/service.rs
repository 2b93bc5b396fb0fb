use chrono::{DateTime, Duration, Utc};
use tracing::{info, instrument, warn};

use classconnect_auth::{issue, verify};
use classconnect_config::JwtConfig;
use classconnect_core::PasswordHasher;
use classconnect_db::{Store, StoreError};
use classconnect_models::auth::{AuthResponse, LoginRequest, RegisterRequest, ResetToken};
use classconnect_models::users::{NewUser, User, UserSummary};

use super::error::AuthError;
use crate::metrics::track_token_issued;
use crate::utils::tokens::generate_reset_token;

pub const RESET_TOKEN_TTL_HOURS: i64 = 24;

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub struct AuthService;

impl AuthService {
    /// Creates the user and its role profile in one step and signs them in.
    #[instrument(skip(db, hasher, jwt_config, dto), fields(email = %dto.email, role = %dto.role))]
    pub async fn register(
        db: &dyn Store,
        hasher: &PasswordHasher,
        jwt_config: &JwtConfig,
        dto: RegisterRequest,
        now: DateTime<Utc>,
    ) -> Result<(User, AuthResponse), AuthError> {
        let email = normalize_email(&dto.email);
        if db.find_user_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = hasher.hash(&dto.password)?;

        let user = db
            .create_user(NewUser {
                email,
                password_hash,
                first_name: dto.first_name.trim().to_string(),
                last_name: dto.last_name.trim().to_string(),
                role: dto.role,
                department: dto.department,
                grade_level: dto.grade_level,
                registered_at: now,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => AuthError::EmailTaken,
                other => AuthError::Store(other),
            })?;

        let token = issue(user.id, &user.email, user.role, now, jwt_config)?;
        track_token_issued("access");
        info!(user_id = user.id, "User registered");

        let response = AuthResponse {
            message: "Registration successful".to_string(),
            token,
            user: UserSummary::from(&user),
        };
        Ok((user, response))
    }

    #[instrument(skip(db, hasher, jwt_config, dto), fields(email = %dto.email))]
    pub async fn login(
        db: &dyn Store,
        hasher: &PasswordHasher,
        jwt_config: &JwtConfig,
        dto: LoginRequest,
        now: DateTime<Utc>,
    ) -> Result<AuthResponse, AuthError> {
        let user = db
            .find_user_by_email(&normalize_email(&dto.email))
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if user.password_hash.is_empty() {
            warn!(user_id = user.id, "User has no password hash");
            return Err(AuthError::InvalidAccountConfiguration);
        }

        if !hasher.verify(&dto.password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        if let Some(requested) = dto.role {
            if requested != user.role {
                return Err(AuthError::RoleMismatch {
                    registered: user.role,
                    requested,
                });
            }
        }

        if let Err(e) = db.update_last_login(user.id, now).await {
            warn!(user_id = user.id, error = %e, "Failed to record last login");
        }

        let token = issue(user.id, &user.email, user.role, now, jwt_config)?;
        track_token_issued("access");

        let summary = Self::display_summary(db, &user).await;
        Ok(AuthResponse {
            message: "Login successful".to_string(),
            token,
            user: summary,
        })
    }

    /// Exchanges a still-valid token for a fresh one carrying the stored
    /// email and role.
    #[instrument(skip_all)]
    pub async fn refresh(
        db: &dyn Store,
        jwt_config: &JwtConfig,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<AuthResponse, AuthError> {
        let claims = verify(token, now, jwt_config)?;

        let user = db
            .find_user_by_id(claims.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let token = issue(user.id, &user.email, user.role, now, jwt_config)?;
        track_token_issued("refresh");

        Ok(AuthResponse {
            message: "Token refreshed".to_string(),
            token,
            user: UserSummary::from(&user),
        })
    }

    /// Mints a 24 hour reset token for the account behind `email`.
    #[instrument(skip(db))]
    pub async fn request_password_reset(
        db: &dyn Store,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<(User, ResetToken), AuthError> {
        let user = db
            .find_user_by_email(&normalize_email(email))
            .await?
            .ok_or(AuthError::EmailNotFound)?;

        let token = Self::mint_single_use_token(db, user.id, now).await?;
        track_token_issued("password_reset");

        Ok((user, token))
    }

    #[instrument(skip(db))]
    pub async fn issue_verification_token(
        db: &dyn Store,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<ResetToken, AuthError> {
        let token = Self::mint_single_use_token(db, user_id, now).await?;
        track_token_issued("email_verification");
        Ok(token)
    }

    /// Finds the token record while it is unexpired and unused.
    #[instrument(skip_all)]
    pub async fn verify_reset_token(
        db: &dyn Store,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<ResetToken, AuthError> {
        db.find_valid_reset_token(token, now)
            .await?
            .filter(|record| record.is_valid_at(now))
            .ok_or(AuthError::InvalidOrExpiredToken)
    }

    /// Sets the new password and drops every outstanding token for the user.
    #[instrument(skip_all)]
    pub async fn reset_password(
        db: &dyn Store,
        hasher: &PasswordHasher,
        token: &str,
        new_password: &str,
        now: DateTime<Utc>,
    ) -> Result<User, AuthError> {
        let record = Self::verify_reset_token(db, token, now).await?;

        let user = db
            .find_user_by_id(record.user_id)
            .await?
            .ok_or(AuthError::InvalidOrExpiredToken)?;

        let password_hash = hasher.hash(new_password)?;
        db.update_password(user.id, &password_hash).await?;

        let removed = db.delete_reset_tokens_for_user(user.id).await?;
        info!(user_id = user.id, removed, "Password reset");

        Ok(user)
    }

    #[instrument(skip_all)]
    pub async fn verify_email(
        db: &dyn Store,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<i64, AuthError> {
        let record = Self::verify_reset_token(db, token, now).await?;

        db.delete_reset_token(record.id).await?;
        db.set_active(record.user_id, true).await?;
        info!(user_id = record.user_id, "Email verified");

        Ok(record.user_id)
    }

    async fn mint_single_use_token(
        db: &dyn Store,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<ResetToken, AuthError> {
        let expires_at = now + Duration::hours(RESET_TOKEN_TTL_HOURS);
        Ok(db
            .insert_reset_token(user_id, &generate_reset_token(), expires_at, now)
            .await?)
    }

    /// Names come from the role profile when it can be read, otherwise from
    /// the user row.
    async fn display_summary(db: &dyn Store, user: &User) -> UserSummary {
        let mut summary = UserSummary::from(user);
        match db.find_profile(user).await {
            Ok(Some(profile)) => {
                let (first, last) = profile.display_name();
                summary.first_name = first.to_string();
                summary.last_name = last.to_string();
            }
            Ok(None) => {}
            Err(e) => warn!(user_id = user.id, error = %e, "Failed to load profile for display name"),
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use classconnect_core::MIN_COST;
    use classconnect_db::{MemoryStore, UserStore};
    use classconnect_models::UserRole;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn jwt() -> JwtConfig {
        JwtConfig::new("test-secret-key-at-least-32-characters-long", 3600)
    }

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(MIN_COST)
    }

    fn register_dto(email: &str, role: UserRole) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "password123".to_string(),
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            role,
            department: Some("Maths".to_string()),
            grade_level: None,
        }
    }

    fn login_dto(email: &str, password: &str, role: Option<UserRole>) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn test_register_then_login_round_trip() {
        let db = MemoryStore::default();
        let (user, registered) = AuthService::register(
            &db,
            &hasher(),
            &jwt(),
            register_dto("Grace@Example.com", UserRole::Teacher),
            now(),
        )
        .await
        .unwrap();
        assert_eq!(user.email, "grace@example.com");

        let response = AuthService::login(
            &db,
            &hasher(),
            &jwt(),
            login_dto("grace@example.com", "password123", Some(UserRole::Teacher)),
            now(),
        )
        .await
        .unwrap();

        let claims = verify(&response.token, now(), &jwt()).unwrap();
        assert_eq!(claims.user_id, registered.user.id);
        assert_eq!(claims.role, UserRole::Teacher);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_taken() {
        let db = MemoryStore::default();
        let dto = || register_dto("dup@example.com", UserRole::Student);
        AuthService::register(&db, &hasher(), &jwt(), dto(), now())
            .await
            .unwrap();

        let err = AuthService::register(&db, &hasher(), &jwt(), dto(), now())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
    }

    #[tokio::test]
    async fn test_login_failures_are_distinguishable_internally() {
        let db = MemoryStore::default();
        AuthService::register(
            &db,
            &hasher(),
            &jwt(),
            register_dto("s@example.com", UserRole::Student),
            now(),
        )
        .await
        .unwrap();

        let unknown = AuthService::login(
            &db,
            &hasher(),
            &jwt(),
            login_dto("nobody@example.com", "password123", None),
            now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(unknown, AuthError::UserNotFound));

        let wrong = AuthService::login(
            &db,
            &hasher(),
            &jwt(),
            login_dto("s@example.com", "wrong-password", None),
            now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(wrong, AuthError::InvalidCredentials));

        let mismatch = AuthService::login(
            &db,
            &hasher(),
            &jwt(),
            login_dto("s@example.com", "password123", Some(UserRole::Teacher)),
            now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            mismatch,
            AuthError::RoleMismatch {
                registered: UserRole::Student,
                requested: UserRole::Teacher
            }
        ));
    }

    #[tokio::test]
    async fn test_reset_token_is_single_use_and_clears_siblings() {
        let db = MemoryStore::default();
        AuthService::register(
            &db,
            &hasher(),
            &jwt(),
            register_dto("r@example.com", UserRole::Student),
            now(),
        )
        .await
        .unwrap();

        let (_, first) = AuthService::request_password_reset(&db, "r@example.com", now())
            .await
            .unwrap();
        let (_, second) = AuthService::request_password_reset(&db, "r@example.com", now())
            .await
            .unwrap();

        AuthService::reset_password(&db, &hasher(), &first.token, "brand-new-pass", now())
            .await
            .unwrap();

        for token in [&first.token, &second.token] {
            let err = AuthService::verify_reset_token(&db, token, now())
                .await
                .unwrap_err();
            assert!(matches!(err, AuthError::InvalidOrExpiredToken));
        }

        AuthService::login(
            &db,
            &hasher(),
            &jwt(),
            login_dto("r@example.com", "brand-new-pass", None),
            now(),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_reset_token_expires_after_ttl() {
        let db = MemoryStore::default();
        AuthService::register(
            &db,
            &hasher(),
            &jwt(),
            register_dto("e@example.com", UserRole::Student),
            now(),
        )
        .await
        .unwrap();

        let (_, token) = AuthService::request_password_reset(&db, "e@example.com", now())
            .await
            .unwrap();

        let later = now() + Duration::hours(RESET_TOKEN_TTL_HOURS);
        let err = AuthService::verify_reset_token(&db, &token.token, later)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidOrExpiredToken));
    }

    #[tokio::test]
    async fn test_forgot_password_unknown_email() {
        let db = MemoryStore::default();
        let err = AuthService::request_password_reset(&db, "ghost@example.com", now())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailNotFound));
    }

    #[tokio::test]
    async fn test_verify_email_consumes_token() {
        let db = MemoryStore::default();
        let (user, _) = AuthService::register(
            &db,
            &hasher(),
            &jwt(),
            register_dto("v@example.com", UserRole::Teacher),
            now(),
        )
        .await
        .unwrap();
        db.set_active(user.id, false).await.unwrap();

        let token = AuthService::issue_verification_token(&db, user.id, now())
            .await
            .unwrap();
        let verified = AuthService::verify_email(&db, &token.token, now())
            .await
            .unwrap();
        assert_eq!(verified, user.id);

        let reloaded = db.find_user_by_id(user.id).await.unwrap().unwrap();
        assert!(reloaded.is_active);

        assert!(
            AuthService::verify_email(&db, &token.token, now())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_refresh_requires_existing_user() {
        let db = MemoryStore::default();
        let orphan = issue(404, "gone@example.com", UserRole::Student, now(), &jwt()).unwrap();
        let err = AuthService::refresh(&db, &jwt(), &orphan, now())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));
    }
}
