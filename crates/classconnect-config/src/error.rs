#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set outside development (ENVIRONMENT={0})")]
    MissingJwtSecret(String),

    #[error("{key} must be set")]
    Missing { key: &'static str },

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}
