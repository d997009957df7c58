//! Deprecated password signup and login.
//!
//! Every response from these routes, errors included, carries deprecation
//! headers pointing clients at the verification flow.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, StatusCode},
    middleware::map_response,
    response::Response,
    routing::post,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use madeinworld_core::Email;

use crate::error::{Result, within};
use crate::extract::ApiJson;
use crate::models::User;
use crate::services::{PasswordAuthService, Signup};
use crate::state::AppState;

const DEPRECATED: &str = "x-deprecated";
const DEPRECATED_MESSAGE: &str = "x-deprecated-message";

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: Email,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Email,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

/// Build the legacy router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .layer(map_response(mark_deprecated))
}

async fn mark_deprecated(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(DEPRECATED, HeaderValue::from_static("true"));
    headers.insert(
        DEPRECATED_MESSAGE,
        HeaderValue::from_static("Use /api/auth/send-verification instead"),
    );
    response
}

async fn signup(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let signup = Signup {
        username: body.username,
        email: body.email,
        password: body.password,
        phone: body.phone,
        first_name: body.first_name,
        last_name: body.last_name,
    };

    let service = PasswordAuthService::new(state.pool());
    let user = within(state.config().request_timeout, service.signup(signup)).await?;
    let issued = state.keys().issue(&user.id.to_string(), user.email.as_str())?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token: issued.token,
            expires_at: issued.expires_at,
            user,
        }),
    ))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let service = PasswordAuthService::new(state.pool());
    let user = within(
        state.config().request_timeout,
        service.login(&body.email, &body.password),
    )
    .await?;
    let issued = state.keys().issue(&user.id.to_string(), user.email.as_str())?;

    Ok(Json(AuthResponse {
        token: issued.token,
        expires_at: issued.expires_at,
        user,
    }))
}
