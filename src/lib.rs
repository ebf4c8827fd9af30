//! # Garita (ERP Authentication & Tenant Session Gate)
//!
//! `garita` is the authentication core of the ERP backend. It validates
//! operator credentials, runs the optional two-factor verification flow, and
//! resolves the `auth_token` cookie into an `(operator, company)` pair that
//! every other endpoint uses to scope its queries.
//!
//! ## Tenant Model (Companies and Operators)
//!
//! Companies are the tenant boundary. Every operator belongs to exactly one
//! company, and no session is created, promoted, or authorized for an
//! inactive company; the company check runs again on every request, so a
//! company deactivated mid-session locks out its operators immediately.
//!
//! ## Sessions
//!
//! Each credential-verified login appends an immutable row to the session
//! ledger and creates a live row in `active_sessions`. The live row holds a
//! SHA-256 hash of the bearer token; raw tokens only travel in the cookie.
//! After a successful code verification at most one live row remains per
//! operator.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
