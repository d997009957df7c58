//! Order service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ORDER_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `JWT_SECRET` - Token verification secret, shared with the auth service.
//!   May be omitted only with `MIW_DEV_MODE=true`.
//!
//! ## Optional
//! - `ORDER_HOST` - Bind address (default: 127.0.0.1)
//! - `ORDER_PORT` - Listen port (default: 8082)
//! - `JWT_EXPIRATION_HOURS` - Session lifetime (default: 24)
//! - `ADMIN_EMAIL` - Address allowed to change order status
//! - `REQUEST_TIMEOUT_SECS` - Per-request deadline (default: 5)
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`
//! - `MIW_DEV_MODE` - Allows the development signing secret

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use chrono::TimeDelta;
use secrecy::SecretString;

use madeinworld_core::config::{
    ConfigError, SentryConfig, SigningSecret, database_url, dev_mode, optional_env, parse_env,
    parse_positive,
};
use madeinworld_core::{DEVELOPMENT_SECRET, Email, SessionKeys};

/// Order application configuration.
#[derive(Debug, Clone)]
pub struct OrderConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    /// Token signing secret
    pub signing_secret: SigningSecret,
    pub session_ttl: TimeDelta,
    /// Only this address may change order status
    pub admin_email: Option<Email>,
    /// Deadline applied to every handler's service call
    pub request_timeout: Duration,
    pub dev_mode: bool,
    pub sentry: SentryConfig,
}

impl OrderConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if the signing secret fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let dev_mode = dev_mode();
        let admin_email = optional_env("ADMIN_EMAIL")
            .map(|raw| {
                Email::parse(&raw)
                    .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_EMAIL".to_owned(), e.to_string()))
            })
            .transpose()?;

        Ok(Self {
            database_url: database_url("ORDER_DATABASE_URL")?,
            host: parse_env("ORDER_HOST", IpAddr::from([127, 0, 0, 1]))?,
            port: parse_env("ORDER_PORT", 8082_u16)?,
            signing_secret: SigningSecret::from_env(dev_mode)?,
            session_ttl: TimeDelta::hours(parse_positive("JWT_EXPIRATION_HOURS", 24)?.into()),
            admin_email,
            request_timeout: Duration::from_secs(parse_positive("REQUEST_TIMEOUT_SECS", 5)?.into()),
            dev_mode,
            sentry: SentryConfig::from_env(),
        })
    }

    /// Development defaults matching the auth service's, so tokens minted
    /// by a development auth service are accepted here.
    ///
    /// # Errors
    ///
    /// Never fails in practice; mirrors `from_env`.
    pub fn development(database_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: SecretString::from(database_url),
            host: IpAddr::from([127, 0, 0, 1]),
            port: 8082,
            signing_secret: SigningSecret::validated(DEVELOPMENT_SECRET.to_owned(), true)?,
            session_ttl: TimeDelta::hours(24),
            admin_email: Email::parse("admin@madeinworld.com").ok(),
            request_timeout: Duration::from_secs(5),
            dev_mode: true,
            sentry: SentryConfig::default(),
        })
    }

    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Session keys for verifying bearer tokens.
    #[must_use]
    pub fn session_keys(&self) -> SessionKeys {
        SessionKeys::new(self.signing_secret.as_bytes(), self.session_ttl)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_development_defaults() {
        let config = OrderConfig::development("postgres://localhost/order").unwrap();

        assert_eq!(config.port, 8082);
        assert!(config.signing_secret.is_development());
        assert_eq!(config.admin_email.unwrap().as_str(), "admin@madeinworld.com");
    }

    #[test]
    fn test_debug_hides_database_url() {
        let config = OrderConfig::development("postgres://miw:hunter2hunter2@db/order").unwrap();
        assert!(!format!("{config:?}").contains("hunter2hunter2"));
    }
}
