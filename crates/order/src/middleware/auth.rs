//! Bearer-token extractors.
//!
//! Tokens are minted by the auth service. Here they are checked for
//! signature and expiry only; no account lookup is made.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use madeinworld_core::{SessionClaims, UserId, bearer_token};

use crate::error::{AppError, set_sentry_user};
use crate::state::AppState;

/// Verified claims of any session, shopper or administrator.
#[derive(Debug, Clone)]
pub struct RequireSession(pub SessionClaims);

/// A shopper session. Administrator tokens carry a synthetic subject and are
/// rejected here.
#[derive(Debug, Clone)]
pub struct RequireUser {
    pub id: UserId,
    pub email: String,
}

impl FromRequestParts<AppState> for RequireSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Authorization header required".to_owned()))?
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid authorization header".to_owned()))?;
        let token = bearer_token(header).ok_or_else(|| {
            AppError::Unauthorized("Authorization header must be 'Bearer <token>'".to_owned())
        })?;

        let claims = state.keys().verify(token)?;
        set_sentry_user(&claims.sub, &claims.email);
        Ok(Self(claims))
    }
}

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireSession(claims) = RequireSession::from_request_parts(parts, state).await?;
        let id = claims.sub.parse::<UserId>().map_err(|_| {
            AppError::Unauthorized("Session does not belong to a customer account".to_owned())
        })?;

        Ok(Self {
            id,
            email: claims.email,
        })
    }
}
