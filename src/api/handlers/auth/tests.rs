//! Handler-level tests for the paths that never reach the database.

use std::sync::Arc;

use axum::extract::Extension;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use secrecy::SecretString;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::api::notify::{LogMailer, Notifier};

use super::login::{login, LoginRequest};
use super::session::logout;
use super::state::{AuthConfig, AuthState};
use super::token::TokenIssuer;
use super::verify::{verify, VerifyRequest};

fn lazy_pool() -> PgPool {
    PgPoolOptions::new()
        .connect_lazy("postgres://postgres@localhost/postgres")
        .expect("lazy pool")
}

fn auth_state() -> Arc<AuthState> {
    let config = AuthConfig::new("https://erp.example.com".to_string());
    let tokens = TokenIssuer::new(SecretString::from("test-signing-key".to_string()));
    let notifier: Arc<dyn Notifier> = Arc::new(LogMailer);
    Arc::new(AuthState::new(config, tokens, notifier))
}

#[tokio::test]
async fn login_missing_payload_is_400() {
    let response = login(
        HeaderMap::new(),
        Extension(lazy_pool()),
        Extension(auth_state()),
        None,
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_blank_fields_are_400() {
    let response = login(
        HeaderMap::new(),
        Extension(lazy_pool()),
        Extension(auth_state()),
        Some(Json(LoginRequest {
            username: "  ".to_string(),
            password: String::new(),
        })),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn verify_missing_payload_is_400() {
    let response = verify(Extension(lazy_pool()), Extension(auth_state()), None)
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn verify_blank_code_is_400() {
    let response = verify(
        Extension(lazy_pool()),
        Extension(auth_state()),
        Some(Json(VerifyRequest {
            username: "ana".to_string(),
            code: " ".to_string(),
        })),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn logout_without_cookie_is_401() {
    let response = logout(HeaderMap::new(), Extension(lazy_pool()))
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn resolve_session_without_cookie_is_401() {
    let response = super::session::resolve_session(HeaderMap::new(), Extension(lazy_pool()))
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_with_unparseable_cookie_header_is_401() {
    let mut headers = HeaderMap::new();
    headers.insert(
        axum::http::header::COOKIE,
        HeaderValue::from_static("other=cookie"),
    );
    let response = logout(headers, Extension(lazy_pool()))
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[test]
fn verify_request_uses_legacy_field_name() {
    let request: VerifyRequest =
        serde_json::from_value(serde_json::json!({
            "username": "ana",
            "cod_verificacion": "a1b2c3"
        }))
        .expect("deserialize");
    assert_eq!(request.username, "ana");
    assert_eq!(request.code, "a1b2c3");
}

#[test]
fn login_request_round_trips() {
    let request = LoginRequest {
        username: "ana".to_string(),
        password: "s3cret".to_string(),
    };
    let value = serde_json::to_value(&request).expect("serialize");
    assert_eq!(
        value.get("username").and_then(serde_json::Value::as_str),
        Some("ana")
    );
    let decoded: LoginRequest = serde_json::from_value(value).expect("deserialize");
    assert_eq!(decoded.password, "s3cret");
}
