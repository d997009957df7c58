//! Deprecated email + password signup and login.
//!
//! Kept for clients that predate verification codes. New clients should use
//! the verification flow; this path receives no further features.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use sqlx::PgPool;
use thiserror::Error;

use madeinworld_core::Email;

use crate::db::{RepositoryError, UserRepository};
use crate::models::{NewUser, PLACEHOLDER_NAME, User};
use crate::services::verification::UserDirectory;

/// Minimum username length.
const MIN_USERNAME_LENGTH: usize = 3;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Errors from the password flow.
#[derive(Debug, Error)]
pub enum PasswordAuthError {
    /// A signup field failed validation.
    #[error("{0}")]
    Invalid(String),

    /// The email is already registered.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Unknown email or wrong password. Deliberately indistinguishable.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Validated signup input.
#[derive(Debug, Clone)]
pub struct Signup {
    pub username: String,
    pub email: Email,
    pub password: String,
    pub phone: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl Signup {
    /// Check field lengths.
    ///
    /// # Errors
    ///
    /// Returns `PasswordAuthError::Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<(), PasswordAuthError> {
        if self.username.trim().chars().count() < MIN_USERNAME_LENGTH {
            return Err(PasswordAuthError::Invalid(format!(
                "username must be at least {MIN_USERNAME_LENGTH} characters"
            )));
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(PasswordAuthError::Invalid(format!(
                "password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }
        Ok(())
    }

    fn into_new_user(self) -> NewUser {
        NewUser {
            username: self.username.trim().to_owned(),
            email: self.email,
            phone: self.phone,
            first_name: self
                .first_name
                .unwrap_or_else(|| PLACEHOLDER_NAME.to_owned()),
            last_name: self.last_name.unwrap_or_else(|| PLACEHOLDER_NAME.to_owned()),
        }
    }
}

/// Password authentication service.
pub struct PasswordAuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> PasswordAuthService<'a> {
    /// Create a new password authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register an account with a password.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` for short fields, `UserAlreadyExists` for a taken email.
    pub async fn signup(&self, signup: Signup) -> Result<User, PasswordAuthError> {
        signup.validate()?;
        let password_hash = hash_password(&signup.password)?;

        let user = self
            .users
            .create_with_password(&signup.into_new_user(), &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => PasswordAuthError::UserAlreadyExists,
                other => PasswordAuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, email = %user.email, "Account created via password signup");
        Ok(user)
    }

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` for an unknown email, an account without a
    /// password, or a wrong password.
    pub async fn login(&self, email: &Email, password: &str) -> Result<User, PasswordAuthError> {
        let (user, password_hash) = self
            .users
            .get_password_hash(email)
            .await?
            .ok_or(PasswordAuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        if let Err(e) = self.users.record_login(user.id, Utc::now()).await {
            tracing::error!(user_id = %user.id, error = %e, "Failed to update last login");
        }

        tracing::info!(user_id = %user.id, "Password login succeeded");
        Ok(user)
    }
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, PasswordAuthError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| PasswordAuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), PasswordAuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordAuthError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| PasswordAuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn signup(username: &str, password: &str) -> Signup {
        Signup {
            username: username.to_owned(),
            email: Email::parse("legacy@example.com").unwrap(),
            password: password.to_owned(),
            phone: None,
            first_name: None,
            last_name: Some("Chen".to_owned()),
        }
    }

    #[test]
    fn test_validate_lengths() {
        assert!(signup("abc", "12345678").validate().is_ok());
        assert!(matches!(
            signup("ab", "12345678").validate(),
            Err(PasswordAuthError::Invalid(msg)) if msg.contains("username")
        ));
        assert!(matches!(
            signup("  ab  ", "12345678").validate(),
            Err(PasswordAuthError::Invalid(_))
        ));
        assert!(matches!(
            signup("abc", "1234567").validate(),
            Err(PasswordAuthError::Invalid(msg)) if msg.contains("password")
        ));
    }

    #[test]
    fn test_missing_names_get_placeholder() {
        let new_user = signup("abc", "12345678").into_new_user();
        assert_eq!(new_user.first_name, PLACEHOLDER_NAME);
        assert_eq!(new_user.last_name, "Chen");
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(PasswordAuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_garbage_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("anything", "plaintext"),
            Err(PasswordAuthError::InvalidCredentials)
        ));
    }
}
