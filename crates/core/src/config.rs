//! Environment configuration helpers shared by the services and the CLI.
//!
//! Each binary owns its config struct; this module provides the lookups,
//! the signing-secret rules, and the Sentry block they have in common.
//!
//! # Signing secret
//!
//! `JWT_SECRET` is mandatory. It must be at least 32 characters, contain no
//! placeholder pattern, and reach 3.3 bits/char of Shannon entropy. Only with
//! `MIW_DEV_MODE=true` may it be absent, in which case
//! [`DEVELOPMENT_SECRET`](crate::DEVELOPMENT_SECRET) is used.

use std::collections::HashMap;
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::session::DEVELOPMENT_SECRET;

/// Environment variable enabling development fallbacks.
pub const DEV_MODE_VAR: &str = "MIW_DEV_MODE";

/// Environment variable holding the token signing secret.
pub const SIGNING_SECRET_VAR: &str = "JWT_SECRET";

const MIN_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// The token signing secret and where it came from.
#[derive(Clone)]
pub struct SigningSecret {
    secret: SecretString,
    development: bool,
}

impl std::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningSecret")
            .field("secret", &"[REDACTED]")
            .field("development", &self.development)
            .finish()
    }
}

impl SigningSecret {
    /// Load `JWT_SECRET`, falling back to the development secret only when
    /// `dev_mode` is set.
    ///
    /// # Errors
    ///
    /// Returns `MissingEnvVar` when absent outside development mode, and
    /// `InsecureSecret` when present but weak.
    pub fn from_env(dev_mode: bool) -> Result<Self, ConfigError> {
        match optional_env(SIGNING_SECRET_VAR) {
            Some(value) => Self::validated(value, dev_mode),
            None if dev_mode => Ok(Self {
                secret: SecretString::from(DEVELOPMENT_SECRET),
                development: true,
            }),
            None => Err(ConfigError::MissingEnvVar(SIGNING_SECRET_VAR.to_owned())),
        }
    }

    /// Validate an explicit secret value.
    ///
    /// # Errors
    ///
    /// Returns `InsecureSecret` if the value is short, a placeholder, low
    /// entropy, or the development secret outside development mode.
    pub fn validated(value: String, dev_mode: bool) -> Result<Self, ConfigError> {
        if value == DEVELOPMENT_SECRET {
            if dev_mode {
                return Ok(Self {
                    secret: SecretString::from(value),
                    development: true,
                });
            }
            return Err(ConfigError::InsecureSecret(
                SIGNING_SECRET_VAR.to_owned(),
                "the development secret cannot be used outside development mode".to_owned(),
            ));
        }

        let secret = SecretString::from(value);
        validate_secret_length(&secret, SIGNING_SECRET_VAR)?;
        validate_secret_strength(secret.expose_secret(), SIGNING_SECRET_VAR)?;

        Ok(Self {
            secret,
            development: false,
        })
    }

    /// Raw key bytes for HMAC signing.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.secret.expose_secret().as_bytes()
    }

    /// True when the publicly known development secret is in use.
    #[must_use]
    pub const fn is_development(&self) -> bool {
        self.development
    }
}

/// Sentry error tracking settings.
#[derive(Debug, Clone, Default)]
pub struct SentryConfig {
    /// Sentry DSN for error tracking
    pub dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub traces_sample_rate: f32,
}

impl SentryConfig {
    /// Read `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, and
    /// `SENTRY_TRACES_SAMPLE_RATE`. Rates default to 1.0.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            dsn: optional_env("SENTRY_DSN"),
            environment: optional_env("SENTRY_ENVIRONMENT"),
            sample_rate: optional_env("SENTRY_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
            traces_sample_rate: optional_env("SENTRY_TRACES_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
        }
    }
}

/// True when `MIW_DEV_MODE` is `true` or `1`.
#[must_use]
pub fn dev_mode() -> bool {
    optional_env(DEV_MODE_VAR).is_some_and(|v| matches!(v.trim(), "true" | "1"))
}

/// Get a required environment variable.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if unset.
pub fn required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

/// Get an optional environment variable. Empty values count as unset.
#[must_use]
pub fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
#[must_use]
pub fn env_or_default(key: &str, default: &str) -> String {
    optional_env(key).unwrap_or_else(|| default.to_owned())
}

/// Parse an environment variable, using `default` when unset.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` if the value does not parse.
pub fn parse_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional_env(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string()))
    })
}

/// Parse a strictly positive integer, using `default` when unset.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` if the value does not parse or is zero.
pub fn parse_positive(key: &str, default: u32) -> Result<u32, ConfigError> {
    let value = parse_env(key, default)?;
    if value == 0 {
        return Err(ConfigError::InvalidEnvVar(
            key.to_owned(),
            "must be greater than zero".to_owned(),
        ));
    }
    Ok(value)
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` naming `primary_key` if neither is set.
pub fn database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    optional_env(primary_key)
        .or_else(|| optional_env("DATABASE_URL"))
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_owned()))
}

/// Validate that a secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let len = secret.expose_secret().chars().count();
    if len < MIN_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
            format!("must be at least {MIN_SECRET_LENGTH} characters (got {len})"),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_owned(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const STRONG: &str = "q8$Lz3!Rw7@Kp1#Vn5^Xc9&Mb2*Ht6(j";

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_strong_secret_accepted() {
        let secret = SigningSecret::validated(STRONG.to_owned(), false).unwrap();
        assert!(!secret.is_development());
        assert_eq!(secret.as_bytes(), STRONG.as_bytes());
    }

    #[test]
    fn test_short_secret_rejected() {
        let err = SigningSecret::validated("aB3$xY9!mK2@".to_owned(), false).unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, msg) if msg.contains("32")));
    }

    #[test]
    fn test_placeholder_secret_rejected() {
        let err = SigningSecret::validated(
            "your-jwt-secret-key-change-this-in-production".to_owned(),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, msg) if msg.contains("placeholder")));
    }

    #[test]
    fn test_low_entropy_secret_rejected() {
        let err = SigningSecret::validated("ab".repeat(20), false).unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, msg) if msg.contains("entropy")));
    }

    #[test]
    fn test_development_secret_only_in_dev_mode() {
        assert!(SigningSecret::validated(DEVELOPMENT_SECRET.to_owned(), false).is_err());
        let secret = SigningSecret::validated(DEVELOPMENT_SECRET.to_owned(), true).unwrap();
        assert!(secret.is_development());
    }

    #[test]
    fn test_signing_secret_debug_redacts() {
        let secret = SigningSecret::validated(STRONG.to_owned(), false).unwrap();
        let debug_output = format!("{secret:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains(STRONG));
    }
}
