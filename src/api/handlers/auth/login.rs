//! Login endpoint: credential verification, ledger append, and the branch
//! between immediate authorization and the one-time-code flow.

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
use tracing::error;
use utoipa::ToSchema;

use super::error::AuthError;
use super::password::verify_password;
use super::payload::{build_payload, AuthPayload};
use super::session::session_cookie;
use super::state::AuthState;
use super::storage::{
    create_session, lookup_operator_auth, record_failed_login, reset_failed_logins, OperatorAuth,
};
use super::utils::{extract_client_ip, generate_one_time_code, hash_bearer_token};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[utoipa::path(
    post,
    path = "/operadores/validar/",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted: full payload + cookie, or a check-your-email detail when a code is required", body = AuthPayload),
        (status = 400, description = "Missing fields"),
        (status = 401, description = "Bad credentials"),
        (status = 403, description = "Operator disabled, locked, or company inactive")
    ),
    tag = "auth"
)]
pub async fn login(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> Result<Response, AuthError> {
    let Some(Json(request)) = payload else {
        return Ok(missing_fields_response());
    };

    let username = request.username.trim();
    if username.is_empty() || request.password.is_empty() {
        return Ok(missing_fields_response());
    }

    let operator = lookup_operator_auth(&pool, username)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if operator.failed_logins >= auth_state.config().max_failed_logins() {
        return Err(AuthError::OperatorLocked);
    }

    if !verify_password(&request.password, &operator.password_hash)? {
        record_failed_login(&pool, operator.id).await?;
        return Err(AuthError::InvalidCredentials);
    }

    if !operator.active {
        return Err(AuthError::OperatorDisabled);
    }
    if !operator.company_active {
        return Err(AuthError::CompanyInactive);
    }

    if operator.failed_logins > 0 {
        reset_failed_logins(&pool, operator.id).await?;
    }

    let client_ip = extract_client_ip(&headers).unwrap_or_default();
    let token = auth_state.tokens().issue(operator.id)?;
    let token_hash = hash_bearer_token(&token);

    if operator.otp_required {
        // Pending session: the token stays server-side until the code checks out.
        let code = generate_one_time_code()?;
        create_session(
            &pool,
            operator.id,
            operator.company_id,
            &client_ip,
            &token_hash,
            Some(&code),
        )
        .await?;

        send_one_time_code(&auth_state, &operator, &code).await;

        return Ok((
            StatusCode::OK,
            Json(json!({
                "detail": "Credenciales válidas. Revisa tu correo e ingresa el código de verificación."
            })),
        )
            .into_response());
    }

    create_session(
        &pool,
        operator.id,
        operator.company_id,
        &client_ip,
        &token_hash,
        None,
    )
    .await?;

    let payload = build_payload(&pool, operator.id, operator.company_id).await?;
    let cookie = session_cookie(&token, auth_state.config().session_ttl_seconds())?;

    let mut response_headers = HeaderMap::new();
    response_headers.insert(SET_COOKIE, cookie);
    Ok((StatusCode::OK, response_headers, Json(payload)).into_response())
}

fn missing_fields_response() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "detail": "Se requieren 'username' y 'password'." })),
    )
        .into_response()
}

/// Best-effort delivery. A slow or failing relay never turns a successful
/// authentication into an error, and the caller is never told it failed.
async fn send_one_time_code(auth_state: &AuthState, operator: &OperatorAuth, code: &str) {
    let body = format!("Hola, tu código es: {code}");
    let send = auth_state
        .notifier()
        .send(&operator.email, "Código de Verificación", &body);

    match tokio::time::timeout(auth_state.config().notify_timeout(), send).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => error!("failed to deliver one-time code: {err:#}"),
        Err(_) => error!("one-time code delivery timed out"),
    }
}
