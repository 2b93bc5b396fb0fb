use crate::{env_bool, env_parse, env_var};

#[derive(Clone, Debug)]
pub struct EmailConfig {
    pub enabled: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_email: String,
    pub from_name: String,
    pub frontend_url: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: "localhost".to_string(),
            smtp_port: 1025,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: "noreply@classconnect.local".to_string(),
            from_name: "ClassConnect".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
        }
    }
}

impl EmailConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: env_bool("SMTP_ENABLED", defaults.enabled),
            smtp_host: env_var("SMTP_HOST").unwrap_or(defaults.smtp_host),
            smtp_port: env_parse("SMTP_PORT", defaults.smtp_port),
            smtp_username: env_var("SMTP_USERNAME").unwrap_or_default(),
            smtp_password: env_var("SMTP_PASSWORD").unwrap_or_default(),
            from_email: env_var("FROM_EMAIL").unwrap_or(defaults.from_email),
            from_name: env_var("FROM_NAME").unwrap_or(defaults.from_name),
            frontend_url: env_var("FRONTEND_URL").unwrap_or(defaults.frontend_url),
        }
    }
}
