//! # ClassConnect Config
//!
//! Configuration structures loaded from environment variables:
//!
//! - [`app`]: deployment environment, listen address, bcrypt cost
//! - [`jwt`]: token signing secret and TTL
//! - [`cors`]: allowed browser origins
//! - [`database`]: storage backend selection and Postgres pool settings
//! - [`email`]: SMTP settings for password-reset mail
//! - [`rate_limit`]: per-IP request budgets
//!
//! Everything is read once by the binary's composition root and handed to
//! the application state. Nothing here is global.
//!
//! # Example
//!
//! ```ignore
//! use classconnect_config::{AppConfig, Environment, JwtConfig};
//!
//! let app = AppConfig::from_env()?;
//! let jwt = JwtConfig::from_env(app.environment)?;
//! ```

pub mod app;
pub mod cors;
pub mod database;
pub mod email;
pub mod error;
pub mod jwt;
pub mod rate_limit;

pub use app::{AppConfig, Environment};
pub use cors::CorsConfig;
pub use database::{DatabaseConfig, StorageBackend};
pub use email::EmailConfig;
pub use error::ConfigError;
pub use jwt::JwtConfig;
pub use rate_limit::{RateLimitConfig, RateLimitRule};

/// Reads an env var, treating empty values as unset.
pub(crate) fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub(crate) fn env_bool(key: &str, default: bool) -> bool {
    env_var(key).and_then(|v| parse_bool(&v)).unwrap_or(default)
}

pub(crate) fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env_var(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool(" On "), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("nope"), None);
    }
}
