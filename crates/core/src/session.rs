//! Signed session tokens.
//!
//! Sessions are stateless HS256 JWTs carrying `sub`, `email`, `iat`, `exp`.
//! A token is trusted when its signature verifies and it has not expired;
//! there is no revocation list. Refresh re-signs the same subject and email
//! with a fresh expiry and does not consult any user store.

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Publicly known signing secret accepted only in explicit development mode.
pub const DEVELOPMENT_SECRET: &str = "madeinworld-development-signing-key-never-deploy";

/// Errors from minting or verifying a session token.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Signature verified but `exp` is in the past.
    #[error("token has expired")]
    Expired,

    /// Malformed token, wrong signature, or missing claims.
    #[error("invalid token: {0}")]
    Invalid(String),

    /// Signing failed.
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Claims embedded in every session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: a user UUID, or `admin-...` for the administrator.
    pub sub: String,
    /// Email the session was issued for.
    pub email: String,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

impl SessionClaims {
    /// Issued-at as a timestamp.
    #[must_use]
    pub fn issued_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.iat, 0).unwrap_or_default()
    }

    /// Expiry as a timestamp.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_default()
    }
}

/// A freshly minted token and its expiry.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Compact JWT.
    pub token: String,
    /// When the token stops verifying.
    pub expires_at: DateTime<Utc>,
    /// The claims that were signed.
    pub claims: SessionClaims,
}

/// Signing and verification keys plus the session lifetime.
///
/// Built once at startup from the configured secret and shared by reference.
/// Implements `Debug` manually so key material never reaches logs.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: TimeDelta,
}

impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeys")
            .field("secret", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl SessionKeys {
    /// Create keys from a shared HMAC secret.
    #[must_use]
    pub fn new(secret: &[u8], ttl: TimeDelta) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Lifetime applied to newly minted tokens.
    #[must_use]
    pub const fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    /// Mint a token for `subject` valid from now.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if encoding fails.
    pub fn issue(&self, subject: &str, email: &str) -> Result<IssuedToken, TokenError> {
        self.issue_at(subject, email, Utc::now())
    }

    /// Mint a token as if issued at `now`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if encoding fails.
    pub fn issue_at(
        &self,
        subject: &str,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        let expires_at = now + self.ttl;
        let claims = SessionClaims {
            sub: subject.to_owned(),
            email: email.to_owned(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(IssuedToken {
            token,
            expires_at: claims.expires_at(),
            claims,
        })
    }

    /// Verify signature and expiry and return the claims.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Expired` for an expired but otherwise valid
    /// token, `TokenError::Invalid` for anything else.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        jsonwebtoken::decode::<SessionClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })
    }

    /// Verify `token` and re-sign its subject and email with a fresh expiry.
    ///
    /// # Errors
    ///
    /// Propagates verification and signing failures.
    pub fn refresh(&self, token: &str) -> Result<IssuedToken, TokenError> {
        let claims = self.verify(token)?;
        self.issue(&claims.sub, &claims.email)
    }
}

/// Extract the token from an `Authorization` header value.
///
/// Only the exact form `Bearer <token>` is accepted.
#[must_use]
pub fn bearer_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ")?;
    if token.is_empty() || token.contains(char::is_whitespace) {
        return None;
    }
    Some(token)
}
