//! Token refresh and the protected profile.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::middleware::{BearerToken, RequireSession};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user_id: String,
    pub email: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Build the token router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/refresh", post(refresh))
        .route("/api/protected/profile", get(profile))
}

/// Re-sign the presented token with a fresh expiry.
///
/// Signature and expiry are the only checks; the subject is not looked up.
async fn refresh(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<Json<TokenResponse>> {
    let issued = state.keys().refresh(&token)?;
    tracing::info!(subject = %issued.claims.sub, "Session token refreshed");

    Ok(Json(TokenResponse {
        token: issued.token,
        expires_at: issued.expires_at,
    }))
}

async fn profile(RequireSession(claims): RequireSession) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        issued_at: claims.issued_at(),
        expires_at: claims.expires_at(),
        user_id: claims.sub,
        email: claims.email,
    })
}
