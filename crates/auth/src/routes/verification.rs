//! Verification code routes for shoppers and the administrator.

use axum::{Json, Router, extract::State, routing::post};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use madeinworld_core::Email;

use crate::db::{UserRepository, VerificationRepository};
use crate::error::{Result, within};
use crate::extract::ApiJson;
use crate::middleware::ClientIp;
use crate::models::Audience;
use crate::services::{OneTimeCode, SessionUser, VerificationService};
use crate::state::AppState;

/// Body of a send-verification request.
#[derive(Debug, Deserialize)]
pub struct SendVerificationRequest {
    pub email: Email,
}

/// Body of a verify-code request.
#[derive(Debug, Deserialize)]
pub struct VerifyCodeRequest {
    pub email: Email,
    pub code: OneTimeCode,
}

#[derive(Debug, Serialize)]
pub struct SendVerificationResponse {
    pub message: &'static str,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct VerifyCodeResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: SessionUser,
}

/// Build the verification router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/send-verification", post(send_user_code))
        .route("/api/auth/verify-code", post(verify_user_code))
        .route("/api/auth/admin/send-verification", post(send_admin_code))
        .route("/api/auth/admin/verify-code", post(verify_admin_code))
}

async fn send_user_code(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    ApiJson(body): ApiJson<SendVerificationRequest>,
) -> Result<Json<SendVerificationResponse>> {
    send_code(&state, Audience::User, &body.email, &client_ip).await
}

async fn send_admin_code(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    ApiJson(body): ApiJson<SendVerificationRequest>,
) -> Result<Json<SendVerificationResponse>> {
    send_code(&state, Audience::Admin, &body.email, &client_ip).await
}

async fn verify_user_code(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<VerifyCodeRequest>,
) -> Result<Json<VerifyCodeResponse>> {
    verify_code(&state, Audience::User, &body).await
}

async fn verify_admin_code(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<VerifyCodeRequest>,
) -> Result<Json<VerifyCodeResponse>> {
    verify_code(&state, Audience::Admin, &body).await
}

async fn send_code(
    state: &AppState,
    audience: Audience,
    email: &Email,
    client_ip: &str,
) -> Result<Json<SendVerificationResponse>> {
    let codes = VerificationRepository::new(state.pool(), audience);
    let users = UserRepository::new(state.pool());
    let service = VerificationService::new(
        audience,
        &codes,
        &users,
        state.mailer(),
        state.hasher(),
        state.keys(),
        &state.config().verification,
    );

    let sent = within(
        state.config().request_timeout,
        service.send_code(email, client_ip),
    )
    .await?;

    Ok(Json(SendVerificationResponse {
        message: "Verification code sent successfully",
        expires_at: sent.expires_at,
    }))
}

async fn verify_code(
    state: &AppState,
    audience: Audience,
    body: &VerifyCodeRequest,
) -> Result<Json<VerifyCodeResponse>> {
    let codes = VerificationRepository::new(state.pool(), audience);
    let users = UserRepository::new(state.pool());
    let service = VerificationService::new(
        audience,
        &codes,
        &users,
        state.mailer(),
        state.hasher(),
        state.keys(),
        &state.config().verification,
    );

    let session = within(
        state.config().request_timeout,
        service.verify(&body.email, &body.code),
    )
    .await?;

    Ok(Json(VerifyCodeResponse {
        token: session.token.token,
        expires_at: session.token.expires_at,
        user: session.user,
    }))
}
