//! Business logic services for auth.
//!
//! # Services
//!
//! - `verification` - Passwordless one-time code issuance and redemption
//! - `email` - Code delivery via SMTP (or the log in development)
//! - `password` - Deprecated password signup and login
//! - `sweep` - Retention cleanup for codes and rate-limit buckets

pub mod email;
pub mod password;
pub mod sweep;
pub mod verification;

pub use email::{DevLogMailer, EmailError, EmailService, Mailer};
pub use password::{PasswordAuthError, PasswordAuthService, Signup};
pub use sweep::{RetentionPolicy, SweepReport, spawn_sweeper, sweep_all};
pub use verification::{
    CodeHasher, CodeSent, OneTimeCode, SessionUser, VerificationError, VerificationPolicy,
    VerificationService, VerifiedSession,
};
