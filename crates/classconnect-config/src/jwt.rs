use std::fmt;

use crate::{ConfigError, Environment, env_var};

/// Signing secret used when `JWT_SECRET` is unset in development only.
pub const DEV_JWT_SECRET: &str = "classconnect-dev-secret-do-not-deploy";

/// 24 hours.
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 86_400;

#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Access token lifetime in seconds.
    pub access_token_expiry: i64,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("access_token_expiry", &self.access_token_expiry)
            .finish()
    }
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>, access_token_expiry: i64) -> Self {
        Self {
            secret: secret.into(),
            access_token_expiry,
        }
    }

    pub fn from_env(environment: Environment) -> Result<Self, ConfigError> {
        Self::resolve(
            env_var("JWT_SECRET"),
            env_var("JWT_ACCESS_EXPIRY"),
            environment,
        )
    }

    /// Builds the config from raw values. A missing secret is only tolerated
    /// in development, where the built-in dev secret is used with a warning.
    pub fn resolve(
        secret: Option<String>,
        expiry: Option<String>,
        environment: Environment,
    ) -> Result<Self, ConfigError> {
        let secret = match secret {
            Some(secret) => secret,
            None if environment.is_development() => {
                tracing::warn!(
                    "JWT_SECRET is not set; signing tokens with the built-in development secret. \
                     Never run like this outside local development."
                );
                DEV_JWT_SECRET.to_string()
            }
            None => return Err(ConfigError::MissingJwtSecret(environment.to_string())),
        };

        let access_token_expiry = match expiry {
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "JWT_ACCESS_EXPIRY",
                        value: raw,
                    });
                }
            },
            None => DEFAULT_ACCESS_TOKEN_TTL_SECS,
        };

        Ok(Self {
            secret,
            access_token_expiry,
        })
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.secret == DEV_JWT_SECRET
    }
}
