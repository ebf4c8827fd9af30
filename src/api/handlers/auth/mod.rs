//! Operator authentication, two-factor verification, and tenant session gate.
//!
//! This module coordinates the whole login surface of the backend:
//!
//! - `POST /operadores/validar/`: credential check, session ledger append,
//!   and either an immediate cookie (no code required) or a one-time code
//!   sent out-of-band.
//! - `POST /operadores/verificar/`: code verification; collapses the
//!   operator's live sessions to one and sets the cookie.
//! - `GET /operadores/sesiones-activas-token/`: resolves the cookie back
//!   into the full authorization payload.
//! - `GET /operadores/logout/`: deletes the live session and clears the
//!   cookie.
//!
//! Every other endpoint in the backend calls [`gate::require_session`] before
//! touching business data. The company-active check runs on each call, so a
//! company deactivated mid-session locks out its operators immediately.
//!
//! Raw bearer tokens are never stored; `active_sessions` holds a SHA-256
//! hash. One-time codes expire and carry an attempt cap (see
//! [`state::AuthConfig`]).

pub(crate) mod error;
pub(crate) mod gate;
pub(crate) mod login;
mod password;
pub(crate) mod payload;
pub(crate) mod session;
mod state;
mod storage;
mod token;
mod utils;
pub(crate) mod verify;

pub use error::AuthError;
pub use gate::{require_session, Principal};
pub use state::{AuthConfig, AuthState};
pub use token::TokenIssuer;

#[cfg(test)]
mod tests;
