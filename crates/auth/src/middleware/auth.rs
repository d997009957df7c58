//! Bearer-token session extractor.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use madeinworld_core::{SessionClaims, bearer_token};

use crate::error::{AppError, set_sentry_user};
use crate::state::AppState;

/// Extractor that requires a valid session token.
///
/// The `Authorization` header must be exactly `Bearer <token>`, and the token
/// must verify against the service's signing key and be unexpired.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireSession(claims): RequireSession,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", claims.email)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireSession(pub SessionClaims);

/// Raw bearer token, for handlers that re-sign it.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl FromRequestParts<AppState> for BearerToken {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Authorization header required".to_owned()))?
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid authorization header".to_owned()))?;

        bearer_token(header)
            .map(|token| Self(token.to_owned()))
            .ok_or_else(|| {
                AppError::Unauthorized("Authorization header must be 'Bearer <token>'".to_owned())
            })
    }
}

impl FromRequestParts<AppState> for RequireSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let claims = state.keys().verify(&token)?;

        set_sentry_user(&claims.sub, Some(&claims.email));
        Ok(Self(claims))
    }
}
