//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Responses carry a JSON body
//! `{"error": "<kind>", "message": "<text>"}`; server-side faults are captured
//! to Sentry and replaced with a generic message.

use std::future::Future;
use std::time::Duration;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use madeinworld_core::TokenError;

use crate::db::RepositoryError;
use crate::services::{PasswordAuthError, VerificationError};

/// Application-level error type for the auth service.
#[derive(Debug, Error)]
pub enum AppError {
    /// Verification flow failed.
    #[error("Verification error: {0}")]
    Verification(#[from] VerificationError),

    /// Legacy password flow failed.
    #[error("Password auth error: {0}")]
    Password(#[from] PasswordAuthError),

    /// Presented token is unusable.
    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Malformed request payload.
    #[error("{0}")]
    Validation(String),

    /// Missing or malformed credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// The request deadline elapsed.
    #[error("Request timed out")]
    Timeout,
}

impl AppError {
    /// HTTP status and machine-readable kind.
    #[must_use]
    pub const fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Verification(err) => match err {
                VerificationError::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
                VerificationError::RateLimited { .. } => {
                    (StatusCode::TOO_MANY_REQUESTS, "rate_limited")
                }
                VerificationError::NoValidCode | VerificationError::InvalidCode => {
                    (StatusCode::UNAUTHORIZED, "invalid_code")
                }
                VerificationError::TooManyAttempts => {
                    (StatusCode::UNAUTHORIZED, "too_many_attempts")
                }
                VerificationError::DeliveryFailed(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "delivery_failed")
                }
                VerificationError::Repository(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "storage_error")
                }
                VerificationError::CodeHash | VerificationError::Token(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
                }
            },
            Self::Password(err) => match err {
                PasswordAuthError::Invalid(_) => (StatusCode::BAD_REQUEST, "validation_error"),
                PasswordAuthError::UserAlreadyExists => (StatusCode::CONFLICT, "conflict"),
                PasswordAuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "unauthorized"),
                PasswordAuthError::Repository(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "storage_error")
                }
                PasswordAuthError::PasswordHash => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
                }
            },
            Self::Token(TokenError::Signing(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
            Self::Token(_) | Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            Self::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            Self::Timeout => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
        }
    }

    /// Client-facing message. Server faults never expose their source text.
    fn public_message(&self) -> String {
        match self {
            Self::Verification(err) => match err {
                // Deliberately identical: do not reveal whether a code exists.
                VerificationError::NoValidCode | VerificationError::InvalidCode => {
                    "Invalid or expired verification code".to_owned()
                }
                VerificationError::TooManyAttempts => {
                    "Too many failed attempts; request a new code".to_owned()
                }
                VerificationError::Forbidden => {
                    "Email is not authorized for administrator access".to_owned()
                }
                VerificationError::RateLimited { max } => {
                    format!("Too many verification requests; limit is {max} per window")
                }
                VerificationError::DeliveryFailed(_) => {
                    "Failed to send verification code".to_owned()
                }
                _ => "Internal server error".to_owned(),
            },
            Self::Password(err) => match err {
                PasswordAuthError::Invalid(msg) => msg.clone(),
                PasswordAuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_owned()
                }
                PasswordAuthError::InvalidCredentials => "Invalid credentials".to_owned(),
                _ => "Internal server error".to_owned(),
            },
            Self::Token(TokenError::Expired) => "Token has expired".to_owned(),
            Self::Token(TokenError::Invalid(_)) => "Invalid token".to_owned(),
            Self::Validation(msg) | Self::Unauthorized(msg) => msg.clone(),
            Self::Timeout => "Request timed out".to_owned(),
            Self::Token(TokenError::Signing(_)) | Self::Database(_) => {
                "Internal server error".to_owned()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                kind,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = Json(json!({
            "error": kind,
            "message": self.public_message(),
        }));

        (status, body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Run `fut` under `deadline`, mapping elapse to `AppError::Timeout`.
///
/// Dropping the inner future on elapse also drops any open transaction it
/// holds, which rolls it back.
///
/// # Errors
///
/// Returns `AppError::Timeout` on elapse, otherwise the future's own error.
pub async fn within<T, E, F>(deadline: Duration, fut: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, E>>,
    AppError: From<E>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result.map_err(AppError::from),
        Err(_) => {
            tracing::warn!(deadline_ms = deadline.as_millis(), "Request deadline elapsed");
            Err(AppError::Timeout)
        }
    }
}

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &str, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_owned()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_missing_and_wrong_code_look_identical() {
        let (s1, b1) = body_json(VerificationError::NoValidCode.into()).await;
        let (s2, b2) = body_json(VerificationError::InvalidCode.into()).await;

        assert_eq!(s1, StatusCode::UNAUTHORIZED);
        assert_eq!(s1, s2);
        assert_eq!(b1, b2);
    }

    #[tokio::test]
    async fn test_storage_errors_hide_details() {
        let err = AppError::Database(RepositoryError::DataCorruption(
            "row 42 has email 'bad'".to_owned(),
        ));
        let (status, body) = body_json(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "storage_error");
        assert!(!body["message"].as_str().unwrap().contains("row 42"));
    }

    #[test]
    fn test_status_codes() {
        fn status(err: impl Into<AppError>) -> StatusCode {
            err.into().status_and_kind().0
        }

        assert_eq!(status(VerificationError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(
            status(VerificationError::RateLimited { max: 5 }),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            status(VerificationError::TooManyAttempts),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status(PasswordAuthError::UserAlreadyExists),
            StatusCode::CONFLICT
        );
        assert_eq!(status(TokenError::Expired), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status(AppError::Validation("bad".to_owned())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status(AppError::Timeout), StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn test_within_times_out() {
        let result: Result<()> = within(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<(), AppError>(())
        })
        .await;

        assert!(matches!(result, Err(AppError::Timeout)));
    }
}
