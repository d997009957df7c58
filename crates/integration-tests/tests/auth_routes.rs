//! Auth service routes driven in-process.
//!
//! Every case here is answered before the handler reaches `PostgreSQL`,
//! except the storage failure case, which relies on the pool being
//! unreachable.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use serde_json::json;

use madeinworld_integration_tests::{
    ADMIN_EMAIL, admin_token, auth_app, expired_token, request, send, send_json, session_keys,
    shopper_token,
};

#[tokio::test]
async fn test_health_names_the_service() {
    let (status, body) = send_json(auth_app(), request(Method::GET, "/health", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "auth");
}

#[tokio::test]
async fn test_live_does_not_touch_the_database() {
    let (status, body) = send_json(auth_app(), request(Method::GET, "/live", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn test_ready_reports_unreachable_database() {
    let response = send(auth_app(), request(Method::GET, "/ready", None, None)).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_send_verification_rejects_malformed_email() {
    let body = json!({ "email": "not-an-email" });
    let (status, body) = send_json(
        auth_app(),
        request(Method::POST, "/api/auth/send-verification", None, Some(&body)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_send_verification_requires_json_body() {
    let (status, body) = send_json(
        auth_app(),
        request(Method::POST, "/api/auth/send-verification", None, None),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_verify_rejects_short_code() {
    let body = json!({ "email": "shopper@example.com", "code": "12345" });
    let (status, body) = send_json(
        auth_app(),
        request(Method::POST, "/api/auth/verify-code", None, Some(&body)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_admin_send_refuses_other_addresses() {
    let body = json!({ "email": "shopper@example.com" });
    let (status, body) = send_json(
        auth_app(),
        request(Method::POST, "/api/auth/admin/send-verification", None, Some(&body)),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn test_admin_verify_refuses_other_addresses() {
    let body = json!({ "email": "shopper@example.com", "code": "123456" });
    let (status, body) = send_json(
        auth_app(),
        request(Method::POST, "/api/auth/admin/verify-code", None, Some(&body)),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn test_storage_failure_hides_details() {
    let body = json!({ "email": "shopper@example.com" });
    let (status, body) = send_json(
        auth_app(),
        request(Method::POST, "/api/auth/send-verification", None, Some(&body)),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "storage_error");
    assert_eq!(body["message"], "Internal server error");
}

#[tokio::test]
async fn test_refresh_reissues_same_identity() {
    let token = shopper_token("shopper@example.com");
    let (status, body) = send_json(
        auth_app(),
        request(Method::POST, "/api/auth/refresh", Some(&token), None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let refreshed = body["token"].as_str().unwrap();
    let claims = session_keys().verify(refreshed).unwrap();
    assert_eq!(claims.email, "shopper@example.com");
    assert_eq!(claims.sub, "6f1c2d3e-4a5b-4c6d-8e7f-9a0b1c2d3e4f");
}

#[tokio::test]
async fn test_refresh_accepts_admin_tokens() {
    let token = admin_token();
    let (status, body) = send_json(
        auth_app(),
        request(Method::POST, "/api/auth/refresh", Some(&token), None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let claims = session_keys().verify(body["token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.email, ADMIN_EMAIL);
}

#[tokio::test]
async fn test_refresh_rejects_expired_token() {
    let token = expired_token("shopper@example.com");
    let (status, body) = send_json(
        auth_app(),
        request(Method::POST, "/api/auth/refresh", Some(&token), None),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token has expired");
}

#[tokio::test]
async fn test_refresh_rejects_garbage_token() {
    let (status, body) = send_json(
        auth_app(),
        request(Method::POST, "/api/auth/refresh", Some("not.a.jwt"), None),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_refresh_requires_header() {
    let (status, _) = send_json(
        auth_app(),
        request(Method::POST, "/api/auth/refresh", None, None),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_echoes_claims() {
    let token = shopper_token("shopper@example.com");
    let (status, body) = send_json(
        auth_app(),
        request(Method::GET, "/api/protected/profile", Some(&token), None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], "6f1c2d3e-4a5b-4c6d-8e7f-9a0b1c2d3e4f");
    assert_eq!(body["email"], "shopper@example.com");
}

#[tokio::test]
async fn test_legacy_signup_validates_before_storage() {
    let body = json!({
        "username": "ab",
        "email": "shopper@example.com",
        "password": "long-enough-password",
    });
    let response = send(
        auth_app(),
        request(Method::POST, "/api/auth/signup", None, Some(&body)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()["x-deprecated"], "true");
}

#[tokio::test]
async fn test_legacy_login_carries_deprecation_headers_on_rejection() {
    let body = json!({ "email": "nope", "password": "whatever" });
    let response = send(
        auth_app(),
        request(Method::POST, "/api/auth/login", None, Some(&body)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()["x-deprecated"], "true");
    assert_eq!(
        response.headers()["x-deprecated-message"],
        "Use /api/auth/send-verification instead"
    );
}
