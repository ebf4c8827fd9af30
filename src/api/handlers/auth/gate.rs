//! Tenant-scoped request authorization.
//!
//! [`require_session`] is the checkpoint every business endpoint runs before
//! touching data: it resolves the cookie to a live session and re-checks the
//! company on each call. The returned [`Principal`] carries the only company
//! id downstream code may use; client-supplied company ids are ignored.

use axum::http::HeaderMap;
use sqlx::PgPool;
use tracing::warn;

use super::error::AuthError;
use super::session::extract_auth_cookie;
use super::storage::{delete_sessions_by_token, lookup_session_by_token};
use super::utils::hash_bearer_token;

/// Authenticated operator context derived from the session cookie.
#[derive(Clone, Debug)]
pub struct Principal {
    pub operator_id: i64,
    pub username: String,
    pub company_id: i64,
}

/// Resolve the `auth_token` cookie into a [`Principal`].
///
/// # Errors
/// `TokenMissing` without a cookie, `TokenInvalid` when no live session
/// matches, `CompanyInactive` when the owning company was deactivated (the
/// session is dropped as a side effect).
pub async fn require_session(headers: &HeaderMap, pool: &PgPool) -> Result<Principal, AuthError> {
    let token = extract_auth_cookie(headers).ok_or(AuthError::TokenMissing)?;
    let token_hash = hash_bearer_token(&token);

    let session = lookup_session_by_token(pool, &token_hash)
        .await?
        .ok_or(AuthError::TokenInvalid)?;

    if !session.company_active {
        // The rejection alone locks the operator out; dropping the rows keeps
        // the table from accumulating sessions that can never authorize again.
        if let Err(err) = delete_sessions_by_token(pool, &token_hash).await {
            warn!("failed to drop session for inactive company: {err:#}");
        }
        return Err(AuthError::CompanyInactive);
    }

    Ok(Principal {
        operator_id: session.operator_id,
        username: session.username,
        company_id: session.company_id,
    })
}
