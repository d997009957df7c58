//! Passwordless verification-code authentication.
//!
//! # Flow
//!
//! 1. `send_code`: identity gate (admin only), per-address rate limit,
//!    generate + hash a six-digit code, persist it, bump the hourly counter,
//!    then hand the plaintext to the mailer.
//! 2. `verify`: load the newest active code for the email, enforce the attempt
//!    ceiling, compare hashes, consume the code, resolve or provision the
//!    account, and mint a session token.
//!
//! Nothing here retries. A failed delivery leaves an orphaned code behind;
//! it is single-use, expires on its own, and the retention sweep removes it.

pub mod code;
mod error;
pub mod store;

use chrono::{DateTime, TimeDelta, Timelike, Utc};
use serde::Serialize;

use madeinworld_core::{Email, IssuedToken, SessionKeys};

pub use code::{CodeFormatError, CodeHasher, OneTimeCode};
pub use error::VerificationError;
pub use store::{CodeMailer, UserDirectory, VerificationStore};

use crate::db::RepositoryError;
use crate::models::{Audience, NewUser, NewVerificationCode, User};

/// Role reported for administrator sessions.
pub const ADMIN_ROLE: &str = "Administrator";

/// Tunables for the verification flow, fixed at startup.
#[derive(Debug, Clone)]
pub struct VerificationPolicy {
    /// How long a code stays redeemable.
    pub code_ttl: TimeDelta,
    /// Comparisons allowed against one code before it locks.
    pub max_attempts: i32,
    /// Codes a client address may request per window.
    pub rate_limit_max: i64,
    /// Trailing window for the rate limit.
    pub rate_limit_window: TimeDelta,
    /// The only address accepted by the admin variant.
    pub admin_email: Option<Email>,
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            code_ttl: TimeDelta::minutes(10),
            max_attempts: 3,
            rate_limit_max: 5,
            rate_limit_window: TimeDelta::hours(1),
            admin_email: None,
        }
    }
}

/// Result of a successful `send_code`. Carries neither the code nor its hash.
#[derive(Debug, Clone, Copy)]
pub struct CodeSent {
    pub expires_at: DateTime<Utc>,
}

/// The administrator identity, which has no account row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminIdentity {
    pub email: Email,
    pub role: &'static str,
    pub created_at: DateTime<Utc>,
}

/// Who a verified session belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SessionUser {
    Customer(User),
    Admin(AdminIdentity),
}

/// Result of a successful `verify`.
#[derive(Debug, Clone)]
pub struct VerifiedSession {
    pub token: IssuedToken,
    pub user: SessionUser,
}

/// Start of the hourly rate-limit bucket containing `at`.
#[must_use]
pub fn hour_bucket(at: DateTime<Utc>) -> DateTime<Utc> {
    at.with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(at)
}

/// Verification service for one audience.
pub struct VerificationService<'a, S, U, M> {
    audience: Audience,
    store: &'a S,
    users: &'a U,
    mailer: &'a M,
    hasher: &'a CodeHasher,
    keys: &'a SessionKeys,
    policy: &'a VerificationPolicy,
}

impl<'a, S, U, M> VerificationService<'a, S, U, M>
where
    S: VerificationStore,
    U: UserDirectory,
    M: CodeMailer,
{
    /// Create a new verification service.
    #[must_use]
    pub const fn new(
        audience: Audience,
        store: &'a S,
        users: &'a U,
        mailer: &'a M,
        hasher: &'a CodeHasher,
        keys: &'a SessionKeys,
        policy: &'a VerificationPolicy,
    ) -> Self {
        Self {
            audience,
            store,
            users,
            mailer,
            hasher,
            keys,
            policy,
        }
    }

    /// Issue a code to `email` on behalf of `client_ip`.
    ///
    /// # Errors
    ///
    /// - `Forbidden` for a non-administrator email on the admin variant
    /// - `RateLimited` when the address has hit the issuance ceiling
    /// - `DeliveryFailed` when the mailer fails
    /// - `CodeHash` / `Repository` for internal failures
    #[tracing::instrument(skip(self), fields(audience = self.audience.as_str()))]
    pub async fn send_code(
        &self,
        email: &Email,
        client_ip: &str,
    ) -> Result<CodeSent, VerificationError> {
        self.authorize(email)?;

        let now = Utc::now();
        let recent = self
            .store
            .requests_since(client_ip, now - self.policy.rate_limit_window)
            .await?;
        if recent >= self.policy.rate_limit_max {
            tracing::warn!(
                client_ip,
                recent,
                max = self.policy.rate_limit_max,
                "Verification code request rate limited"
            );
            return Err(VerificationError::RateLimited {
                max: self.policy.rate_limit_max,
            });
        }

        let code = OneTimeCode::generate();
        let expires_at = now + self.policy.code_ttl;
        let new_code = NewVerificationCode {
            email: email.clone(),
            code_hash: self.hasher.hash(&code)?,
            client_ip: client_ip.to_owned(),
            expires_at,
        };

        self.store.insert_code(&new_code).await?;
        self.store.record_request(client_ip, hour_bucket(now)).await?;

        self.mailer
            .send_code(email, &code, self.audience)
            .await
            .map_err(|e| {
                tracing::error!(email = %email, error = %e, "Failed to deliver verification code");
                VerificationError::DeliveryFailed(e)
            })?;

        tracing::info!(email = %email, client_ip, %expires_at, "Verification code issued");
        Ok(CodeSent { expires_at })
    }

    /// Redeem `code` for `email` and mint a session.
    ///
    /// # Errors
    ///
    /// - `NoValidCode` when nothing redeemable exists (or it was consumed concurrently)
    /// - `TooManyAttempts` once the attempt ceiling is reached, even for the right code
    /// - `InvalidCode` on mismatch (the attempt counts toward the ceiling)
    /// - `Token` / `Repository` / `CodeHash` for internal failures
    #[tracing::instrument(skip(self, code), fields(audience = self.audience.as_str()))]
    pub async fn verify(
        &self,
        email: &Email,
        code: &OneTimeCode,
    ) -> Result<VerifiedSession, VerificationError> {
        self.authorize(email)?;

        let now = Utc::now();
        let Some(record) = self.store.latest_active_code(email, now).await? else {
            tracing::warn!(email = %email, "Verification attempted without an active code");
            return Err(VerificationError::NoValidCode);
        };

        // Only a counted guess is compared.
        let Some(attempt) = self
            .store
            .claim_attempt(record.id, self.policy.max_attempts)
            .await?
        else {
            tracing::warn!(
                email = %email,
                max = self.policy.max_attempts,
                "Verification code locked after too many attempts"
            );
            return Err(VerificationError::TooManyAttempts);
        };

        if !self.hasher.matches(code, &record.code_hash)? {
            tracing::warn!(
                email = %email,
                attempt,
                max = self.policy.max_attempts,
                "Verification code mismatch"
            );
            return Err(VerificationError::InvalidCode);
        }

        if !self.store.mark_used(record.id).await? {
            tracing::warn!(email = %email, "Verification code consumed concurrently");
            return Err(VerificationError::NoValidCode);
        }

        let (subject, user) = match self.audience {
            Audience::User => {
                let user = self.resolve_user(email).await?;
                if let Err(e) = self.users.record_login(user.id, now).await {
                    tracing::error!(user_id = %user.id, error = %e, "Failed to update last login");
                }
                (user.id.to_string(), SessionUser::Customer(user))
            }
            Audience::Admin => (
                email.admin_subject(),
                SessionUser::Admin(AdminIdentity {
                    email: email.clone(),
                    role: ADMIN_ROLE,
                    created_at: now,
                }),
            ),
        };

        let token = self.keys.issue(&subject, email.as_str())?;
        tracing::info!(email = %email, subject = %subject, "Verification succeeded");

        Ok(VerifiedSession { token, user })
    }

    fn authorize(&self, email: &Email) -> Result<(), VerificationError> {
        if self.audience == Audience::Admin && self.policy.admin_email.as_ref() != Some(email) {
            tracing::warn!(email = %email, "Admin verification for unauthorized email");
            return Err(VerificationError::Forbidden);
        }
        Ok(())
    }

    /// Find the account for `email`, provisioning it on first login.
    async fn resolve_user(&self, email: &Email) -> Result<User, VerificationError> {
        if let Some(user) = self.users.find_by_email(email).await? {
            return Ok(user);
        }

        match self.users.create(&NewUser::from_verified_email(email)).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, email = %email, "Provisioned account on first login");
                Ok(user)
            }
            // Lost a race with a concurrent first login for the same email.
            Err(RepositoryError::Conflict(_)) => self
                .users
                .find_by_email(email)
                .await?
                .ok_or(VerificationError::Repository(RepositoryError::NotFound)),
            Err(e) => Err(e.into()),
        }
    }
}
