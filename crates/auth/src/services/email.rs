//! Verification code delivery.
//!
//! Production delivery goes over SMTP via lettre with Askama templates.
//! Development mode may swap in [`DevLogMailer`], which writes the code to
//! the log instead of sending mail.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use madeinworld_core::Email;

use crate::config::EmailConfig;
use crate::models::Audience;
use crate::services::verification::{CodeMailer, OneTimeCode};

#[derive(Template)]
#[template(path = "email/verification_code.html")]
struct VerificationCodeHtml<'a> {
    code: &'a str,
    minutes: i64,
    admin: bool,
}

#[derive(Template)]
#[template(path = "email/verification_code.txt")]
struct VerificationCodeText<'a> {
    code: &'a str,
    minutes: i64,
    admin: bool,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// SMTP mailer for verification codes.
#[derive(Clone)]
pub struct EmailService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    code_ttl_minutes: i64,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the relay cannot be configured or the sender address
    /// is malformed.
    pub fn new(config: &EmailConfig, code_ttl_minutes: i64) -> Result<Self, EmailError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_owned(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        let from = config
            .from_address
            .parse()
            .map_err(|_| EmailError::InvalidAddress(config.from_address.clone()))?;

        Ok(Self {
            transport,
            from,
            code_ttl_minutes,
        })
    }

    fn subject(audience: Audience) -> &'static str {
        match audience {
            Audience::User => "Your MadeInWorld verification code",
            Audience::Admin => "Your MadeInWorld administrator verification code",
        }
    }

    async fn send_multipart(
        &self,
        to: &Email,
        subject: &str,
        text_body: String,
        html_body: String,
    ) -> Result<(), EmailError> {
        let recipient: Mailbox = to
            .as_str()
            .parse()
            .map_err(|_| EmailError::InvalidAddress(to.to_string()))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body),
                    ),
            )?;

        self.transport.send(message).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

impl CodeMailer for EmailService {
    async fn send_code(
        &self,
        to: &Email,
        code: &OneTimeCode,
        audience: Audience,
    ) -> Result<(), EmailError> {
        let admin = audience == Audience::Admin;
        let html = VerificationCodeHtml {
            code: code.as_str(),
            minutes: self.code_ttl_minutes,
            admin,
        }
        .render()?;
        let text = VerificationCodeText {
            code: code.as_str(),
            minutes: self.code_ttl_minutes,
            admin,
        }
        .render()?;

        self.send_multipart(to, Self::subject(audience), text, html)
            .await
    }
}

/// Writes codes to the log. Only constructed when development mode is on.
#[derive(Debug, Clone, Copy, Default)]
pub struct DevLogMailer;

impl CodeMailer for DevLogMailer {
    async fn send_code(
        &self,
        to: &Email,
        code: &OneTimeCode,
        audience: Audience,
    ) -> Result<(), EmailError> {
        tracing::warn!(
            to = %to,
            audience = audience.as_str(),
            code = code.as_str(),
            "Development mode: verification code not emailed"
        );
        Ok(())
    }
}

/// The mailer chosen at startup.
#[derive(Clone)]
pub enum Mailer {
    Smtp(EmailService),
    DevLog(DevLogMailer),
}

impl CodeMailer for Mailer {
    async fn send_code(
        &self,
        to: &Email,
        code: &OneTimeCode,
        audience: Audience,
    ) -> Result<(), EmailError> {
        match self {
            Self::Smtp(service) => service.send_code(to, code, audience).await,
            Self::DevLog(log) => log.send_code(to, code, audience).await,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_include_code_and_lifetime() {
        let html = VerificationCodeHtml {
            code: "048213",
            minutes: 10,
            admin: false,
        }
        .render()
        .unwrap();
        let text = VerificationCodeText {
            code: "048213",
            minutes: 10,
            admin: false,
        }
        .render()
        .unwrap();

        for body in [&html, &text] {
            assert!(body.contains("048213"));
            assert!(body.contains("10 minutes"));
        }
        assert!(!text.contains("administrator"));
    }

    #[test]
    fn test_admin_template_mentions_administrator() {
        let text = VerificationCodeText {
            code: "111111",
            minutes: 10,
            admin: true,
        }
        .render()
        .unwrap();
        assert!(text.contains("administrator"));
    }

    #[tokio::test]
    async fn test_dev_log_mailer_accepts_everything() {
        let mailer = Mailer::DevLog(DevLogMailer);
        let to = Email::parse("user@example.com").unwrap();
        let code = OneTimeCode::parse("123456").unwrap();
        assert!(mailer.send_code(&to, &code, Audience::User).await.is_ok());
    }
}
