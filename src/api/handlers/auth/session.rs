//! Session resolution and logout endpoints, plus `auth_token` cookie helpers.

use anyhow::{anyhow, Result};
use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sqlx::PgPool;
use tracing::debug;

use super::error::AuthError;
use super::gate::require_session;
use super::payload::{build_payload, AuthPayload};
use super::storage::delete_sessions_by_token;
use super::utils::hash_bearer_token;

pub(super) const AUTH_COOKIE_NAME: &str = "auth_token";

#[utoipa::path(
    get,
    path = "/operadores/sesiones-activas-token/",
    responses(
        (status = 200, description = "Session resolved", body = AuthPayload),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Company inactive")
    ),
    tag = "auth"
)]
pub async fn resolve_session(
    headers: HeaderMap,
    pool: Extension<PgPool>,
) -> Result<Response, AuthError> {
    let principal = require_session(&headers, &pool).await?;
    let payload = build_payload(&pool, principal.operator_id, principal.company_id).await?;
    Ok((StatusCode::OK, Json(payload)).into_response())
}

#[utoipa::path(
    get,
    path = "/operadores/logout/",
    responses(
        (status = 200, description = "Session closed, cookie cleared"),
        (status = 401, description = "Missing token")
    ),
    tag = "auth"
)]
pub async fn logout(headers: HeaderMap, pool: Extension<PgPool>) -> Result<Response, AuthError> {
    let token = extract_auth_cookie(&headers).ok_or(AuthError::TokenMissing)?;
    let token_hash = hash_bearer_token(&token);

    // Idempotent: a racing logout already removed the rows, nothing to undo.
    let deleted = delete_sessions_by_token(&pool, &token_hash).await?;
    if deleted == 0 {
        debug!("logout for a session that was already gone");
    }

    let mut response_headers = HeaderMap::new();
    response_headers.insert(SET_COOKIE, clear_session_cookie()?);
    Ok((
        StatusCode::OK,
        response_headers,
        Json(json!({ "detail": "Sesión cerrada correctamente" })),
    )
        .into_response())
}

/// Build the `HttpOnly` session cookie for a freshly issued token.
pub(super) fn session_cookie(token: &str, max_age_seconds: i64) -> Result<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{AUTH_COOKIE_NAME}={token}; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age={max_age_seconds}"
    ))
    .map_err(|err| anyhow!("failed to build session cookie: {err}"))
}

fn clear_session_cookie() -> Result<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{AUTH_COOKIE_NAME}=; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age=0"
    ))
    .map_err(|err| anyhow!("failed to build clearing cookie: {err}"))
}

/// Read the `auth_token` cookie from the request headers.
pub(super) fn extract_auth_cookie(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(axum::http::header::COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == AUTH_COOKIE_NAME {
            return Some(val.to_string());
        }
    }
    None
}
