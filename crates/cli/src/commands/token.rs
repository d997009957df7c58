//! Development token minting.
//!
//! Signs with the same secret and lifetime rules as the services, so a token
//! printed here is accepted by both when they share `JWT_SECRET`.

use chrono::TimeDelta;
use thiserror::Error;

use madeinworld_core::config::{ConfigError, SigningSecret, dev_mode, parse_positive};
use madeinworld_core::{Email, EmailError, SessionKeys, TokenError, UserId};

#[derive(Debug, Error)]
pub enum TokenCommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

/// Mint and log a token for `email`.
///
/// # Errors
///
/// Returns `TokenCommandError` if the secret is missing or weak, the email is
/// malformed, or signing fails.
pub fn run(email: &str, subject: Option<&str>) -> Result<(), TokenCommandError> {
    dotenvy::dotenv().ok();

    let email = Email::parse(email)?;
    let secret = SigningSecret::from_env(dev_mode())?;
    let ttl = TimeDelta::hours(parse_positive("JWT_EXPIRATION_HOURS", 24)?.into());
    let keys = SessionKeys::new(secret.as_bytes(), ttl);

    let subject = subject.map_or_else(|| UserId::generate().to_string(), str::to_owned);
    let issued = keys.issue(&subject, email.as_str())?;

    if secret.is_development() {
        tracing::warn!("Signed with the development secret");
    }
    tracing::info!("Subject: {}", issued.claims.sub);
    tracing::info!("Expires: {}", issued.expires_at);
    tracing::info!("Token: {}", issued.token);
    Ok(())
}
