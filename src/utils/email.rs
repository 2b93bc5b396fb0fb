use lettre::message::{MultiPart, SinglePart, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{debug, instrument};

use classconnect_config::EmailConfig;

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("invalid address {address}: {reason}")]
    Address { address: String, reason: String },

    #[error("failed to build email: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("failed to reach SMTP relay: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("mail task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Outgoing account mail. With SMTP disabled the message is only logged.
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    pub fn reset_link(&self, token: &str) -> String {
        format!("{}/reset-password?token={}", self.config.frontend_url, token)
    }

    pub fn verification_link(&self, token: &str) -> String {
        format!("{}/verify-email?token={}", self.config.frontend_url, token)
    }

    #[instrument(skip(self, reset_token))]
    pub async fn send_password_reset_email(
        &self,
        to_email: &str,
        to_name: &str,
        reset_token: &str,
    ) -> Result<(), EmailError> {
        let link = self.reset_link(reset_token);
        let text_body = format!(
            "Hi {to_name},\n\n\
             We received a request to reset your ClassConnect password.\n\n\
             Open this link to choose a new one:\n\
             {link}\n\n\
             The link expires in 24 hours. If you did not ask for this, ignore this email."
        );
        let html_body = self.template(
            "Reset your password",
            to_name,
            "We received a request to reset your ClassConnect password. The link below expires in 24 hours.",
            "Reset Password",
            &link,
        );

        self.send_email(to_email, "Password Reset Request", text_body, html_body)
            .await
    }

    #[instrument(skip(self, verification_token))]
    pub async fn send_verification_email(
        &self,
        to_email: &str,
        to_name: &str,
        verification_token: &str,
    ) -> Result<(), EmailError> {
        let link = self.verification_link(verification_token);
        let text_body = format!(
            "Welcome to ClassConnect, {to_name}!\n\n\
             Confirm your email address by opening this link:\n\
             {link}\n\n\
             The link expires in 24 hours."
        );
        let html_body = self.template(
            "Confirm your email",
            to_name,
            "Welcome to ClassConnect! Confirm your email address to finish setting up your account.",
            "Verify Email",
            &link,
        );

        self.send_email(to_email, "Verify your email address", text_body, html_body)
            .await
    }

    #[instrument(skip(self, text_body, html_body))]
    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        text_body: String,
        html_body: String,
    ) -> Result<(), EmailError> {
        if !self.config.enabled {
            debug!(to = %to_email, subject = %subject, body = %text_body, "SMTP disabled, email not sent");
            return Ok(());
        }

        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);

        let email = Message::builder()
            .from(from.parse().map_err(|e: lettre::address::AddressError| {
                EmailError::Address {
                    address: from.clone(),
                    reason: e.to_string(),
                }
            })?)
            .to(to_email.parse().map_err(|e: lettre::address::AddressError| {
                EmailError::Address {
                    address: to_email.to_string(),
                    reason: e.to_string(),
                }
            })?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(text_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(html_body),
                    ),
            )?;

        let mailer = if self.config.smtp_username.is_empty() {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
                .port(self.config.smtp_port)
                .build()
        } else {
            let creds = Credentials::new(
                self.config.smtp_username.clone(),
                self.config.smtp_password.clone(),
            );

            SmtpTransport::relay(&self.config.smtp_host)?
                .port(self.config.smtp_port)
                .credentials(creds)
                .build()
        };

        tokio::task::spawn_blocking(move || mailer.send(&email)).await??;

        Ok(())
    }

    fn template(&self, title: &str, name: &str, intro: &str, action: &str, link: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
</head>
<body style="margin: 0; padding: 20px; font-family: Arial, sans-serif; background-color: #f4f4f4;">
    <div style="max-width: 600px; margin: 0 auto; background-color: #ffffff; border-radius: 8px; overflow: hidden;">
        <div style="background-color: #2563EB; padding: 24px; text-align: center;">
            <h1 style="margin: 0; color: #ffffff; font-size: 26px;">ClassConnect</h1>
        </div>
        <div style="padding: 32px 28px; color: #444444; font-size: 16px; line-height: 1.5;">
            <h2 style="margin: 0 0 16px 0; color: #222222;">{title}</h2>
            <p>Hi <strong>{name}</strong>,</p>
            <p>{intro}</p>
            <p style="text-align: center; margin: 28px 0;">
                <a href="{link}" style="display: inline-block; padding: 12px 36px; background-color: #2563EB; color: #ffffff; text-decoration: none; border-radius: 6px; font-weight: bold;">{action}</a>
            </p>
            <p style="font-size: 14px;">Or paste this link into your browser:</p>
            <p style="font-size: 14px; color: #2563EB; word-break: break-all;">{link}</p>
        </div>
        <div style="background-color: #f8f9fa; padding: 16px; text-align: center; font-size: 12px; color: #999999;">
            This is an automated email from ClassConnect. Please do not reply.
        </div>
    </div>
</body>
</html>"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> EmailService {
        EmailService::new(EmailConfig {
            frontend_url: "https://app.example.com".to_string(),
            ..EmailConfig::default()
        })
    }

    #[test]
    fn test_links_carry_token() {
        let service = service();
        assert_eq!(
            service.reset_link("abc"),
            "https://app.example.com/reset-password?token=abc"
        );
        assert_eq!(
            service.verification_link("xyz"),
            "https://app.example.com/verify-email?token=xyz"
        );
    }

    #[tokio::test]
    async fn test_disabled_smtp_skips_sending() {
        let result = service()
            .send_password_reset_email("someone@example.com", "Some One", "tok")
            .await;
        assert!(result.is_ok());
    }
}
