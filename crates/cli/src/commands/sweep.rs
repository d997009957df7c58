//! One-shot retention sweep.
//!
//! # Environment Variables
//!
//! - `AUTH_DATABASE_URL` - Auth database (falls back to `DATABASE_URL`)
//! - `CODE_RETENTION_HOURS` - default 1
//! - `RATE_LIMIT_RETENTION_HOURS` - default 24

use std::time::Duration;

use chrono::TimeDelta;
use thiserror::Error;

use madeinworld_auth::db::{RepositoryError, create_pool};
use madeinworld_auth::services::{RetentionPolicy, sweep_all};
use madeinworld_core::config::{ConfigError, database_url, parse_positive};

#[derive(Debug, Error)]
pub enum SweepError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Connect(#[from] sqlx::Error),

    #[error("Sweep failed: {0}")]
    Sweep(#[from] RepositoryError),
}

/// Run one sweep over both audiences' tables.
///
/// # Errors
///
/// Returns `SweepError` if configuration is invalid, the database is
/// unreachable, or a delete fails.
pub async fn run() -> Result<(), SweepError> {
    dotenvy::dotenv().ok();

    let url = database_url("AUTH_DATABASE_URL")?;
    let policy = RetentionPolicy {
        code_retention: TimeDelta::hours(parse_positive("CODE_RETENTION_HOURS", 1)?.into()),
        rate_limit_retention: TimeDelta::hours(
            parse_positive("RATE_LIMIT_RETENTION_HOURS", 24)?.into(),
        ),
    };

    tracing::info!("Connecting to auth database...");
    let pool = create_pool(&url, Duration::from_secs(10)).await?;

    let report = sweep_all(&pool, &policy).await?;
    tracing::info!(
        "Removed {} verification codes and {} rate-limit buckets",
        report.codes_removed,
        report.rate_limits_removed
    );
    Ok(())
}
