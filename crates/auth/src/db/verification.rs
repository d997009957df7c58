//! Verification code and rate-limit repository.
//!
//! One repository type serves both audiences; the audience picks the table
//! pair. Table names come from [`Audience`], never from input.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use madeinworld_core::{Email, VerificationCodeId};

use super::RepositoryError;
use crate::models::{Audience, NewVerificationCode, VerificationCode};
use crate::services::verification::VerificationStore;

const CODE_COLUMNS: &str = "id, email, code_hash, client_ip, attempts, expires_at, used, created_at";

/// Internal row type for database queries.
#[derive(Debug, sqlx::FromRow)]
struct VerificationCodeRow {
    id: Uuid,
    email: String,
    code_hash: String,
    client_ip: String,
    attempts: i32,
    expires_at: DateTime<Utc>,
    used: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<VerificationCodeRow> for VerificationCode {
    type Error = RepositoryError;

    fn try_from(row: VerificationCodeRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: VerificationCodeId::from_uuid(row.id),
            email,
            code_hash: row.code_hash,
            client_ip: row.client_ip,
            attempts: row.attempts,
            expires_at: row.expires_at,
            used: row.used,
            created_at: row.created_at,
        })
    }
}

/// Repository for one audience's codes and rate-limit buckets.
pub struct VerificationRepository<'a> {
    pool: &'a PgPool,
    audience: Audience,
}

impl<'a> VerificationRepository<'a> {
    /// Create a new verification repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool, audience: Audience) -> Self {
        Self { pool, audience }
    }

    const fn codes(&self) -> &'static str {
        self.audience.codes_table()
    }

    const fn rate_limits(&self) -> &'static str {
        self.audience.rate_limits_table()
    }
}

impl VerificationStore for VerificationRepository<'_> {
    async fn requests_since(
        &self,
        client_ip: &str,
        since: DateTime<Utc>,
    ) -> Result<i64, RepositoryError> {
        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COALESCE(SUM(request_count), 0)::BIGINT FROM {} \
             WHERE client_ip = $1 AND window_start > $2",
            self.rate_limits()
        ))
        .bind(client_ip)
        .bind(since)
        .fetch_one(self.pool)
        .await?;

        Ok(total)
    }

    async fn record_request(
        &self,
        client_ip: &str,
        bucket: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(&format!(
            "INSERT INTO {table} (client_ip, window_start, request_count) VALUES ($1, $2, 1) \
             ON CONFLICT (client_ip, window_start) \
             DO UPDATE SET request_count = {table}.request_count + 1",
            table = self.rate_limits()
        ))
        .bind(client_ip)
        .bind(bucket)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    async fn insert_code(
        &self,
        code: &NewVerificationCode,
    ) -> Result<VerificationCode, RepositoryError> {
        let row: VerificationCodeRow = sqlx::query_as(&format!(
            "INSERT INTO {} (id, email, code_hash, client_ip, expires_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {CODE_COLUMNS}",
            self.codes()
        ))
        .bind(VerificationCodeId::generate().as_uuid())
        .bind(code.email.as_str())
        .bind(&code.code_hash)
        .bind(&code.client_ip)
        .bind(code.expires_at)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    async fn latest_active_code(
        &self,
        email: &Email,
        now: DateTime<Utc>,
    ) -> Result<Option<VerificationCode>, RepositoryError> {
        let row: Option<VerificationCodeRow> = sqlx::query_as(&format!(
            "SELECT {CODE_COLUMNS} FROM {} \
             WHERE email = $1 AND used = FALSE AND expires_at > $2 \
             ORDER BY created_at DESC \
             LIMIT 1",
            self.codes()
        ))
        .bind(email.as_str())
        .bind(now)
        .fetch_optional(self.pool)
        .await?;

        row.map(VerificationCode::try_from).transpose()
    }

    async fn claim_attempt(
        &self,
        id: VerificationCodeId,
        max_attempts: i32,
    ) -> Result<Option<i32>, RepositoryError> {
        let attempts: Option<i32> = sqlx::query_scalar(&format!(
            "UPDATE {} SET attempts = attempts + 1 \
             WHERE id = $1 AND attempts < $2 \
             RETURNING attempts",
            self.codes()
        ))
        .bind(id.as_uuid())
        .bind(max_attempts)
        .fetch_optional(self.pool)
        .await?;

        Ok(attempts)
    }

    async fn mark_used(&self, id: VerificationCodeId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(&format!(
            "UPDATE {} SET used = TRUE WHERE id = $1 AND used = FALSE",
            self.codes()
        ))
        .bind(id.as_uuid())
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn purge_codes_expired_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE expires_at < $1", self.codes()))
            .bind(cutoff)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn purge_rate_limits_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE window_start < $1",
            self.rate_limits()
        ))
        .bind(cutoff)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
