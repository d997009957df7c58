//! Retention sweep for expired codes and stale rate-limit buckets.
//!
//! Runs on an interval inside the auth service and on demand via
//! `miw-cli sweep`.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use sqlx::PgPool;
use tokio::task::JoinHandle;

use crate::db::{RepositoryError, VerificationRepository};
use crate::models::Audience;
use crate::services::verification::VerificationStore;

/// How long rows outlive their usefulness before deletion.
#[derive(Debug, Clone, Copy)]
pub struct RetentionPolicy {
    /// Codes are deleted this long after they expire.
    pub code_retention: TimeDelta,
    /// Buckets are deleted this long after their window started.
    pub rate_limit_retention: TimeDelta,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            code_retention: TimeDelta::hours(1),
            rate_limit_retention: TimeDelta::hours(24),
        }
    }
}

/// Rows removed by a sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub codes_removed: u64,
    pub rate_limits_removed: u64,
}

impl std::ops::Add for SweepReport {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            codes_removed: self.codes_removed + other.codes_removed,
            rate_limits_removed: self.rate_limits_removed + other.rate_limits_removed,
        }
    }
}

/// Sweep one store as of `now`.
///
/// # Errors
///
/// Returns `RepositoryError` if either delete fails.
pub async fn sweep_store<S: VerificationStore>(
    store: &S,
    policy: &RetentionPolicy,
    now: DateTime<Utc>,
) -> Result<SweepReport, RepositoryError> {
    let codes_removed = store
        .purge_codes_expired_before(now - policy.code_retention)
        .await?;
    let rate_limits_removed = store
        .purge_rate_limits_before(now - policy.rate_limit_retention)
        .await?;

    Ok(SweepReport {
        codes_removed,
        rate_limits_removed,
    })
}

/// Sweep both audiences' tables.
///
/// # Errors
///
/// Returns `RepositoryError` on the first failed delete.
pub async fn sweep_all(
    pool: &PgPool,
    policy: &RetentionPolicy,
) -> Result<SweepReport, RepositoryError> {
    let now = Utc::now();
    let mut report = SweepReport::default();

    for audience in [Audience::User, Audience::Admin] {
        let repo = VerificationRepository::new(pool, audience);
        report = report + sweep_store(&repo, policy, now).await?;
    }

    tracing::info!(
        codes_removed = report.codes_removed,
        rate_limits_removed = report.rate_limits_removed,
        "Retention sweep complete"
    );
    Ok(report)
}

/// Spawn the periodic sweep. The first pass runs after one full interval.
pub fn spawn_sweeper(pool: PgPool, policy: RetentionPolicy, every: Duration) -> JoinHandle<()> {
    tracing::info!(interval_secs = every.as_secs(), "Spawning retention sweep task");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = sweep_all(&pool, &policy).await {
                tracing::error!(error = %e, "Retention sweep failed");
            }
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use madeinworld_core::{Email, VerificationCodeId};

    use super::*;
    use crate::models::VerificationCode;
    use crate::services::verification::tests::MemoryStore;

    fn code_expiring(at: DateTime<Utc>) -> VerificationCode {
        VerificationCode {
            id: VerificationCodeId::generate(),
            email: Email::parse("user@example.com").unwrap(),
            code_hash: "$argon2id$stub".to_owned(),
            client_ip: "203.0.113.7".to_owned(),
            attempts: 0,
            expires_at: at,
            used: false,
            created_at: at - TimeDelta::minutes(10),
        }
    }

    #[tokio::test]
    async fn test_sweep_respects_retention_windows() {
        let now = Utc::now();
        let store = MemoryStore::default();
        {
            let mut codes = store.codes.lock().unwrap();
            codes.push(code_expiring(now - TimeDelta::hours(2)));
            codes.push(code_expiring(now - TimeDelta::minutes(30)));
            codes.push(code_expiring(now + TimeDelta::minutes(5)));
        }
        {
            let mut buckets = store.buckets.lock().unwrap();
            buckets.insert(("203.0.113.7".to_owned(), now - TimeDelta::hours(30)), 3);
            buckets.insert(("203.0.113.7".to_owned(), now - TimeDelta::hours(2)), 1);
        }

        let report = sweep_store(&store, &RetentionPolicy::default(), now)
            .await
            .unwrap();

        assert_eq!(
            report,
            SweepReport {
                codes_removed: 1,
                rate_limits_removed: 1,
            }
        );
        assert_eq!(store.codes.lock().unwrap().len(), 2);
        assert_eq!(store.buckets.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_reports_add() {
        let a = SweepReport {
            codes_removed: 2,
            rate_limits_removed: 1,
        };
        let b = SweepReport {
            codes_removed: 3,
            rate_limits_removed: 0,
        };
        assert_eq!(
            a + b,
            SweepReport {
                codes_removed: 5,
                rate_limits_removed: 1,
            }
        );
    }
}
