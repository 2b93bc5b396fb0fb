use std::fmt;
use std::sync::Arc;

use classconnect_config::{CorsConfig, EmailConfig, JwtConfig, RateLimitConfig};
use classconnect_core::PasswordHasher;
use classconnect_db::Store;

/// Everything a handler needs, built once by the composition root.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Store>,
    pub jwt_config: JwtConfig,
    pub email_config: EmailConfig,
    pub cors_config: CorsConfig,
    pub rate_limit_config: RateLimitConfig,
    pub hasher: PasswordHasher,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("jwt_config", &self.jwt_config)
            .field("email_config", &self.email_config.enabled)
            .field("cors_config", &self.cors_config)
            .field("rate_limit_config", &self.rate_limit_config)
            .field("hasher", &self.hasher)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// State with default email, CORS and rate limit settings.
    pub fn new(db: Arc<dyn Store>, jwt_config: JwtConfig, hasher: PasswordHasher) -> Self {
        Self {
            db,
            jwt_config,
            email_config: EmailConfig::default(),
            cors_config: CorsConfig::default(),
            rate_limit_config: RateLimitConfig::default(),
            hasher,
        }
    }

    pub fn with_email_config(mut self, email_config: EmailConfig) -> Self {
        self.email_config = email_config;
        self
    }

    pub fn with_cors_config(mut self, cors_config: CorsConfig) -> Self {
        self.cors_config = cors_config;
        self
    }

    pub fn with_rate_limit_config(mut self, rate_limit_config: RateLimitConfig) -> Self {
        self.rate_limit_config = rate_limit_config;
        self
    }

    pub fn store(&self) -> &dyn Store {
        self.db.as_ref()
    }
}
