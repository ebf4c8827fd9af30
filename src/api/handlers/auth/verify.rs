//! One-time code verification endpoint.

use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use utoipa::ToSchema;

use super::error::AuthError;
use super::payload::{build_payload, AuthPayload};
use super::session::session_cookie;
use super::state::AuthState;
use super::storage::{
    find_pending_by_code, lookup_operator_auth, promote_session, record_failed_code_attempt,
};
use super::utils::hash_bearer_token;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VerifyRequest {
    pub username: String,
    #[serde(rename = "cod_verificacion")]
    pub code: String,
}

#[utoipa::path(
    post,
    path = "/operadores/verificar/",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Code accepted: full payload + cookie", body = AuthPayload),
        (status = 400, description = "Missing fields"),
        (status = 401, description = "Unknown user or wrong code"),
        (status = 403, description = "Company inactive")
    ),
    tag = "auth"
)]
pub async fn verify(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<VerifyRequest>>,
) -> Result<Response, AuthError> {
    let Some(Json(request)) = payload else {
        return Ok(missing_fields_response());
    };

    let username = request.username.trim();
    let code = request.code.trim();
    if username.is_empty() || code.is_empty() {
        return Ok(missing_fields_response());
    }

    // Unknown usernames take the same path as wrong codes.
    let operator = lookup_operator_auth(&pool, username)
        .await?
        .ok_or(AuthError::InvalidCode)?;

    if !operator.company_active {
        return Err(AuthError::CompanyInactive);
    }

    let pending = find_pending_by_code(
        &pool,
        operator.id,
        code,
        auth_state.config().code_ttl_seconds(),
        auth_state.config().code_max_attempts(),
    )
    .await?;

    let Some(pending) = pending else {
        // Expired and exhausted codes burn attempts exactly like mismatches.
        record_failed_code_attempt(&pool, operator.id).await?;
        return Err(AuthError::InvalidCode);
    };

    // The pre-verification token never reached the client; mint the one that
    // will, and collapse every other live session for this operator.
    let token = auth_state.tokens().issue(operator.id)?;
    let token_hash = hash_bearer_token(&token);
    promote_session(&pool, pending.id, operator.id, &token_hash).await?;

    let payload = build_payload(&pool, operator.id, operator.company_id).await?;
    let cookie = session_cookie(&token, auth_state.config().session_ttl_seconds())?;

    let mut response_headers = HeaderMap::new();
    response_headers.insert(SET_COOKIE, cookie);
    Ok((StatusCode::OK, response_headers, Json(payload)).into_response())
}

fn missing_fields_response() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "detail": "Se requieren 'username' y 'cod_verificacion'." })),
    )
        .into_response()
}
