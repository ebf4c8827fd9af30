//! Database helpers for credentials, the session ledger, and live sessions.
//!
//! Lookups return `Option` on a miss; callers decide which error that maps
//! to. Writes that must stay consistent (ledger + live session, promotion +
//! sibling collapse) share one transaction.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tracing::{info_span, Instrument};

/// Credential-check projection of an operator row, joined with its company.
pub(super) struct OperatorAuth {
    pub(super) id: i64,
    pub(super) username: String,
    pub(super) email: String,
    pub(super) password_hash: String,
    pub(super) active: bool,
    pub(super) failed_logins: i32,
    pub(super) otp_required: bool,
    pub(super) company_id: i64,
    pub(super) company_active: bool,
}

/// Minimal data resolved from a bearer-token lookup.
pub(super) struct SessionAuth {
    pub(super) operator_id: i64,
    pub(super) username: String,
    pub(super) company_id: i64,
    pub(super) company_active: bool,
}

/// A live session whose one-time code matched.
pub(super) struct PendingSession {
    pub(super) id: i64,
}

pub(super) async fn lookup_operator_auth(
    pool: &PgPool,
    username: &str,
) -> Result<Option<OperatorAuth>> {
    let query = r"
        SELECT o.id, o.username, o.email, o.password_hash, o.active,
               o.failed_logins, o.otp_required, o.company_id,
               c.active AS company_active
        FROM operators o
        JOIN companies c ON c.id = o.company_id
        WHERE o.username = $1
        LIMIT 1
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup operator")?;

    Ok(row.map(|row| OperatorAuth {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        active: row.get("active"),
        failed_logins: row.get("failed_logins"),
        otp_required: row.get("otp_required"),
        company_id: row.get("company_id"),
        company_active: row.get("company_active"),
    }))
}

pub(super) async fn record_failed_login(pool: &PgPool, operator_id: i64) -> Result<()> {
    let query = "UPDATE operators SET failed_logins = failed_logins + 1 WHERE id = $1";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(operator_id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to record failed login")?;
    Ok(())
}

pub(super) async fn reset_failed_logins(pool: &PgPool, operator_id: i64) -> Result<()> {
    let query = "UPDATE operators SET failed_logins = 0 WHERE id = $1 AND failed_logins <> 0";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(operator_id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to reset failed logins")?;
    Ok(())
}

/// Append a ledger row and create the matching live session.
///
/// Both rows land in one transaction: a crash between them never leaves an
/// audit row without a live session or vice versa. `one_time_code` is `Some`
/// for the pending (code required) branch and `None` for direct logins.
pub(super) async fn create_session(
    pool: &PgPool,
    operator_id: i64,
    company_id: i64,
    ip: &str,
    token_hash: &[u8],
    one_time_code: Option<&str>,
) -> Result<()> {
    let mut tx = pool.begin().await.context("begin login transaction")?;

    let query = r"
        INSERT INTO sessions (ip, logged_at, operator_id, company_id)
        VALUES ($1, NOW(), $2, $3)
        RETURNING id
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(ip)
        .bind(operator_id)
        .bind(company_id)
        .fetch_one(&mut *tx)
        .instrument(span)
        .await
        .context("failed to insert session ledger row")?;

    let session_id: i64 = row.get("id");

    let query = r"
        INSERT INTO active_sessions
            (operator_id, company_id, session_id, token_hash, one_time_code, code_attempts, created_at)
        VALUES ($1, $2, $3, $4, $5, 0, NOW())
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(operator_id)
        .bind(company_id)
        .bind(session_id)
        .bind(token_hash)
        .bind(one_time_code)
        .execute(&mut *tx)
        .instrument(span)
        .await
        .context("failed to insert active session")?;

    tx.commit().await.context("commit login transaction")?;

    Ok(())
}

/// Find the newest live session whose unconsumed code matches, is within the
/// TTL window, and has attempts left.
pub(super) async fn find_pending_by_code(
    pool: &PgPool,
    operator_id: i64,
    code: &str,
    ttl_seconds: i64,
    max_attempts: i32,
) -> Result<Option<PendingSession>> {
    let query = r"
        SELECT id
        FROM active_sessions
        WHERE operator_id = $1
          AND one_time_code = $2
          AND code_attempts < $3
          AND created_at > NOW() - ($4 * INTERVAL '1 second')
        ORDER BY created_at DESC
        LIMIT 1
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(operator_id)
        .bind(code)
        .bind(max_attempts)
        .bind(ttl_seconds)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup pending session by code")?;

    Ok(row.map(|row| PendingSession { id: row.get("id") }))
}

/// Count a failed code submission against every pending session of the
/// operator, so retries burn attempts no matter which row they target.
pub(super) async fn record_failed_code_attempt(pool: &PgPool, operator_id: i64) -> Result<()> {
    let query = r"
        UPDATE active_sessions
        SET code_attempts = code_attempts + 1
        WHERE operator_id = $1
          AND one_time_code IS NOT NULL
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(operator_id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to record failed code attempt")?;
    Ok(())
}

/// Promote the winning session and collapse the operator's others.
///
/// One transaction covers consuming the code, storing the fresh token hash,
/// and deleting sibling rows; there is never a window with two verified
/// rows for one operator.
pub(super) async fn promote_session(
    pool: &PgPool,
    active_session_id: i64,
    operator_id: i64,
    token_hash: &[u8],
) -> Result<()> {
    let mut tx = pool.begin().await.context("begin promote transaction")?;

    let query = r"
        UPDATE active_sessions
        SET token_hash = $2,
            one_time_code = NULL
        WHERE id = $1
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(active_session_id)
        .bind(token_hash)
        .execute(&mut *tx)
        .instrument(span)
        .await
        .context("failed to promote active session")?;

    let query = "DELETE FROM active_sessions WHERE operator_id = $1 AND id <> $2";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(operator_id)
        .bind(active_session_id)
        .execute(&mut *tx)
        .instrument(span)
        .await
        .context("failed to collapse sibling sessions")?;

    tx.commit().await.context("commit promote transaction")?;

    Ok(())
}

pub(super) async fn lookup_session_by_token(
    pool: &PgPool,
    token_hash: &[u8],
) -> Result<Option<SessionAuth>> {
    let query = r"
        SELECT a.operator_id, o.username, a.company_id,
               c.active AS company_active
        FROM active_sessions a
        JOIN operators o ON o.id = a.operator_id
        JOIN companies c ON c.id = a.company_id
        WHERE a.token_hash = $1
        ORDER BY a.created_at DESC
        LIMIT 1
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token_hash)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup session by token")?;

    Ok(row.map(|row| SessionAuth {
        operator_id: row.get("operator_id"),
        username: row.get("username"),
        company_id: row.get("company_id"),
        company_active: row.get("company_active"),
    }))
}

/// Delete every live session matching the token. Idempotent; deleting zero
/// rows is not an error.
pub(super) async fn delete_sessions_by_token(pool: &PgPool, token_hash: &[u8]) -> Result<u64> {
    let query = "DELETE FROM active_sessions WHERE token_hash = $1";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(token_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete sessions")?;
    Ok(result.rows_affected())
}
