//! Database operations for the auth service `PostgreSQL`.
//!
//! ## Tables
//!
//! - `users` - Customer accounts (shared with the order service)
//! - `user_verification_codes` / `admin_verification_codes` - Hashed one-time codes
//! - `user_rate_limits` / `admin_rate_limits` - Hourly issuance counters per client address
//!
//! # Schema
//!
//! DDL lives in `crates/auth/migrations/` and is applied by operators before
//! the service starts. The service never migrates on startup.

pub mod users;
pub mod verification;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use users::UserRepository;
pub use verification::VerificationRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map a unique-constraint violation to `RepositoryError::Conflict`.
pub(crate) fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool.
///
/// `acquire_timeout` bounds how long a request waits for a free connection;
/// exhaustion surfaces as an error instead of an unbounded queue.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(
    database_url: &secrecy::SecretString,
    acquire_timeout: Duration,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(acquire_timeout)
        .connect(database_url.expose_secret())
        .await
}
