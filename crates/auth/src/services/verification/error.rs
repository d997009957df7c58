//! Verification flow errors.

use thiserror::Error;

use madeinworld_core::TokenError;

use crate::db::RepositoryError;
use crate::services::email::EmailError;

/// Errors from sending or redeeming verification codes.
#[derive(Debug, Error)]
pub enum VerificationError {
    /// Admin variant: the email is not the configured administrator.
    #[error("email is not authorized for administrator access")]
    Forbidden,

    /// Issuance ceiling reached for this client address.
    #[error("too many verification requests; limit is {max} per window")]
    RateLimited {
        /// Configured ceiling.
        max: i64,
    },

    /// No unused, unexpired code exists for the email.
    #[error("no valid verification code")]
    NoValidCode,

    /// The active code has used up its attempts.
    #[error("maximum verification attempts exceeded")]
    TooManyAttempts,

    /// The submitted code does not match.
    #[error("invalid verification code")]
    InvalidCode,

    /// The mail collaborator failed.
    #[error("failed to deliver verification code: {0}")]
    DeliveryFailed(#[source] EmailError),

    /// Hashing failed or a stored hash is unreadable.
    #[error("failed to hash verification code")]
    CodeHash,

    /// Minting the session token failed.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// Storage failure.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}
