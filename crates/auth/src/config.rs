//! Auth service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `AUTH_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `JWT_SECRET` - Token signing secret (min 32 chars, high entropy).
//!   May be omitted only with `MIW_DEV_MODE=true`.
//! - `SMTP_HOST`, `SMTP_USERNAME`, `SMTP_PASSWORD`, `SMTP_FROM_ADDRESS` -
//!   Mail relay. May be omitted only with `MIW_DEV_MODE=true`, in which case
//!   codes are written to the log.
//!
//! ## Optional
//! - `AUTH_HOST` - Bind address (default: 127.0.0.1)
//! - `AUTH_PORT` - Listen port (default: 8081)
//! - `JWT_EXPIRATION_HOURS` - Session lifetime (default: 24)
//! - `CODE_EXPIRATION_MINUTES` - Code lifetime (default: 10)
//! - `MAX_CODE_ATTEMPTS` - Failed comparisons before lockout (default: 3)
//! - `RATE_LIMIT_REQUESTS_PER_HOUR` - Codes per client address per window (default: 5)
//! - `RATE_LIMIT_WINDOW_HOURS` - Rate-limit window (default: 1)
//! - `ADMIN_EMAIL` - Administrator address (falls back to `SMTP_FROM_ADDRESS`)
//! - `SMTP_PORT` - SMTP port (default: 587)
//! - `REQUEST_TIMEOUT_SECS` - Per-request deadline (default: 5)
//! - `CLEANUP_INTERVAL_MINUTES` - Retention sweep interval (default: 30)
//! - `CODE_RETENTION_HOURS` - Keep expired codes this long (default: 1)
//! - `RATE_LIMIT_RETENTION_HOURS` - Keep rate-limit buckets this long (default: 24)
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`
//! - `MIW_DEV_MODE` - Enables the development fallbacks above

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use chrono::TimeDelta;
use secrecy::SecretString;

use madeinworld_core::config::{
    self as env, ConfigError, SentryConfig, SigningSecret, database_url, optional_env,
    parse_env, parse_positive, required_env,
};
use madeinworld_core::{DEVELOPMENT_SECRET, Email, SessionKeys};

use crate::services::{RetentionPolicy, VerificationPolicy};

/// Auth application configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Token signing secret
    pub signing_secret: SigningSecret,
    /// Lifetime of minted session tokens
    pub session_ttl: TimeDelta,
    /// Verification code rules, including the administrator address
    pub verification: VerificationPolicy,
    /// Retention windows for the sweep
    pub retention: RetentionPolicy,
    /// How often the sweep runs
    pub cleanup_interval: Duration,
    /// Mail relay; `None` only in development mode
    pub email: Option<EmailConfig>,
    /// Deadline applied to every handler's service call
    pub request_timeout: Duration,
    /// Development fallbacks enabled
    pub dev_mode: bool,
    /// Error tracking
    pub sentry: SentryConfig,
}

/// Email (SMTP) configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct EmailConfig {
    /// SMTP server hostname
    pub smtp_host: String,
    /// SMTP server port
    pub smtp_port: u16,
    /// SMTP authentication username
    pub smtp_username: String,
    /// SMTP authentication password
    pub smtp_password: SecretString,
    /// Email sender address (From header)
    pub from_address: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl EmailConfig {
    /// `None` when `SMTP_HOST` is unset; otherwise the rest of the block is required.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(smtp_host) = optional_env("SMTP_HOST") else {
            return Ok(None);
        };

        Ok(Some(Self {
            smtp_host,
            smtp_port: parse_env("SMTP_PORT", 587)?,
            smtp_username: required_env("SMTP_USERNAME")?,
            smtp_password: SecretString::from(required_env("SMTP_PASSWORD")?),
            from_address: required_env("SMTP_FROM_ADDRESS")?,
        }))
    }
}

impl AuthConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, if
    /// the signing secret fails validation, or if SMTP is unconfigured outside
    /// development mode.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let dev_mode = env::dev_mode();
        let database_url = database_url("AUTH_DATABASE_URL")?;
        let host = parse_env("AUTH_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = parse_env("AUTH_PORT", 8081_u16)?;
        let signing_secret = SigningSecret::from_env(dev_mode)?;

        let email = EmailConfig::from_env()?;
        if email.is_none() && !dev_mode {
            return Err(ConfigError::MissingEnvVar("SMTP_HOST".to_owned()));
        }

        let admin_email = optional_env("ADMIN_EMAIL")
            .map(|v| ("ADMIN_EMAIL", v))
            .or_else(|| email.as_ref().map(|e| ("SMTP_FROM_ADDRESS", e.from_address.clone())))
            .map(|(key, raw)| {
                Email::parse(&raw)
                    .map_err(|e| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string()))
            })
            .transpose()?;

        let verification = VerificationPolicy {
            code_ttl: TimeDelta::minutes(parse_positive("CODE_EXPIRATION_MINUTES", 10)?.into()),
            max_attempts: positive_i32("MAX_CODE_ATTEMPTS", 3)?,
            rate_limit_max: parse_positive("RATE_LIMIT_REQUESTS_PER_HOUR", 5)?.into(),
            rate_limit_window: TimeDelta::hours(parse_positive("RATE_LIMIT_WINDOW_HOURS", 1)?.into()),
            admin_email,
        };

        let retention = RetentionPolicy {
            code_retention: TimeDelta::hours(parse_positive("CODE_RETENTION_HOURS", 1)?.into()),
            rate_limit_retention: TimeDelta::hours(
                parse_positive("RATE_LIMIT_RETENTION_HOURS", 24)?.into(),
            ),
        };

        Ok(Self {
            database_url,
            host,
            port,
            signing_secret,
            session_ttl: TimeDelta::hours(parse_positive("JWT_EXPIRATION_HOURS", 24)?.into()),
            verification,
            retention,
            cleanup_interval: Duration::from_secs(
                u64::from(parse_positive("CLEANUP_INTERVAL_MINUTES", 30)?) * 60,
            ),
            email,
            request_timeout: Duration::from_secs(parse_positive("REQUEST_TIMEOUT_SECS", 5)?.into()),
            dev_mode,
            sentry: SentryConfig::from_env(),
        })
    }

    /// Development defaults: no SMTP, the development signing secret, and
    /// `admin@madeinworld.com` as administrator.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the signature matches `from_env` for callers
    /// that treat both the same way.
    pub fn development(database_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: SecretString::from(database_url),
            host: IpAddr::from([127, 0, 0, 1]),
            port: 8081,
            signing_secret: SigningSecret::validated(DEVELOPMENT_SECRET.to_owned(), true)?,
            session_ttl: TimeDelta::hours(24),
            verification: VerificationPolicy {
                admin_email: Email::parse("admin@madeinworld.com").ok(),
                ..VerificationPolicy::default()
            },
            retention: RetentionPolicy::default(),
            cleanup_interval: Duration::from_secs(30 * 60),
            email: None,
            request_timeout: Duration::from_secs(5),
            dev_mode: true,
            sentry: SentryConfig::default(),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Session signing keys built from the configured secret and lifetime.
    #[must_use]
    pub fn session_keys(&self) -> SessionKeys {
        SessionKeys::new(self.signing_secret.as_bytes(), self.session_ttl)
    }
}

fn positive_i32(key: &str, default: u32) -> Result<i32, ConfigError> {
    i32::try_from(parse_positive(key, default)?)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_development_defaults() {
        let config = AuthConfig::development("postgres://localhost/auth").unwrap();

        assert!(config.dev_mode);
        assert!(config.signing_secret.is_development());
        assert!(config.email.is_none());
        assert_eq!(config.verification.code_ttl, TimeDelta::minutes(10));
        assert_eq!(config.verification.max_attempts, 3);
        assert_eq!(config.verification.rate_limit_max, 5);
        assert_eq!(config.retention.rate_limit_retention, TimeDelta::hours(24));
    }

    #[test]
    fn test_socket_addr() {
        let config = AuthConfig::development("postgres://localhost/auth").unwrap();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 8081);
    }

    #[test]
    fn test_session_keys_use_configured_ttl() {
        let mut config = AuthConfig::development("postgres://localhost/auth").unwrap();
        config.session_ttl = TimeDelta::hours(2);
        let issued = config.session_keys().issue("subject", "a@b.co").unwrap();
        assert_eq!(issued.claims.exp - issued.claims.iat, 2 * 3600);
    }

    #[test]
    fn test_email_config_debug_redacts_secrets() {
        let config = EmailConfig {
            smtp_host: "smtp.example.com".to_owned(),
            smtp_port: 587,
            smtp_username: "mailer".to_owned(),
            smtp_password: SecretString::from("super_secret_smtp_password"),
            from_address: "noreply@madeinworld.com".to_owned(),
        };

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("smtp.example.com"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_smtp_password"));
    }
}
