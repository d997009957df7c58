//! Verification code and audience models.

use chrono::{DateTime, Utc};
use serde::Serialize;

use madeinworld_core::{Email, VerificationCodeId};

/// Which population a verification flow serves.
///
/// Each audience has its own code and rate-limit tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    /// Any shopper with a syntactically valid email.
    User,
    /// The single configured administrator address.
    Admin,
}

impl Audience {
    /// Table holding this audience's codes.
    #[must_use]
    pub const fn codes_table(self) -> &'static str {
        match self {
            Self::User => "user_verification_codes",
            Self::Admin => "admin_verification_codes",
        }
    }

    /// Table holding this audience's hourly issuance counters.
    #[must_use]
    pub const fn rate_limits_table(self) -> &'static str {
        match self {
            Self::User => "user_rate_limits",
            Self::Admin => "admin_rate_limits",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

/// A stored verification code. Only the hash is ever persisted.
#[derive(Debug, Clone)]
pub struct VerificationCode {
    pub id: VerificationCodeId,
    pub email: Email,
    pub code_hash: String,
    pub client_ip: String,
    pub attempts: i32,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

impl VerificationCode {
    /// Returns true if the code is past its expiry at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Returns true if the code can still be redeemed at `now`.
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.used && !self.is_expired_at(now)
    }
}

/// Fields for a new code row.
#[derive(Debug, Clone)]
pub struct NewVerificationCode {
    pub email: Email,
    pub code_hash: String,
    pub client_ip: String,
    pub expires_at: DateTime<Utc>,
}
