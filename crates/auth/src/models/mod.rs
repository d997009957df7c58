//! Domain models for the auth service.

pub mod user;
pub mod verification;

pub use user::{NewUser, PLACEHOLDER_NAME, User};
pub use verification::{Audience, NewVerificationCode, VerificationCode};
