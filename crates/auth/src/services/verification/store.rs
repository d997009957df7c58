//! Persistence and delivery seams for the verification flow.
//!
//! The service is written against these traits. `PostgreSQL` repositories
//! implement them in production; tests substitute in-memory stores.

use std::future::Future;

use chrono::{DateTime, Utc};

use madeinworld_core::{Email, UserId, VerificationCodeId};

use super::code::OneTimeCode;
use crate::db::RepositoryError;
use crate::models::{Audience, NewUser, NewVerificationCode, User, VerificationCode};
use crate::services::email::EmailError;

/// Code and rate-limit storage for one audience.
pub trait VerificationStore: Send + Sync {
    /// Sum of request counts for `client_ip` in buckets starting after `since`.
    fn requests_since(
        &self,
        client_ip: &str,
        since: DateTime<Utc>,
    ) -> impl Future<Output = Result<i64, RepositoryError>> + Send;

    /// Increment the counter for (`client_ip`, `bucket`), creating it at 1.
    fn record_request(
        &self,
        client_ip: &str,
        bucket: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Persist a new code.
    fn insert_code(
        &self,
        code: &NewVerificationCode,
    ) -> impl Future<Output = Result<VerificationCode, RepositoryError>> + Send;

    /// Most recently created unused code for `email` that is unexpired at `now`.
    fn latest_active_code(
        &self,
        email: &Email,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<Option<VerificationCode>, RepositoryError>> + Send;

    /// Reserve one comparison against the code: increment the attempt
    /// counter only while it is below `max_attempts`, in a single statement.
    /// Returns the new count, or `None` once the ceiling is reached.
    fn claim_attempt(
        &self,
        id: VerificationCodeId,
        max_attempts: i32,
    ) -> impl Future<Output = Result<Option<i32>, RepositoryError>> + Send;

    /// Flip `used` from false to true. Returns false if it was already used.
    fn mark_used(
        &self,
        id: VerificationCodeId,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Delete codes that expired before `cutoff`. Returns rows removed.
    fn purge_codes_expired_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> impl Future<Output = Result<u64, RepositoryError>> + Send;

    /// Delete rate-limit buckets that started before `cutoff`. Returns rows removed.
    fn purge_rate_limits_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> impl Future<Output = Result<u64, RepositoryError>> + Send;
}

/// Account lookup and provisioning.
pub trait UserDirectory: Send + Sync {
    fn find_by_email(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Insert an account. Fails with `RepositoryError::Conflict` if the email exists.
    fn create(
        &self,
        user: &NewUser,
    ) -> impl Future<Output = Result<User, RepositoryError>> + Send;

    fn record_login(
        &self,
        id: UserId,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// Out-of-band delivery of a plaintext code.
pub trait CodeMailer: Send + Sync {
    fn send_code(
        &self,
        to: &Email,
        code: &OneTimeCode,
        audience: Audience,
    ) -> impl Future<Output = Result<(), EmailError>> + Send;
}
