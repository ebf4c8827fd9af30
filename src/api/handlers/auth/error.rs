//! Error taxonomy for the authentication and session endpoints.
//!
//! Three classes, mapped 1:1 to HTTP statuses: authentication failures
//! (generic 401, never revealing whether the username, password, or code was
//! wrong), authorization failures (403, safe to name the cause), and token
//! failures (401). Everything else is a 500 that gets logged server-side.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown username or wrong password; the caller cannot tell which.
    #[error("invalid credentials")]
    InvalidCredentials,
    /// Unknown username or wrong/expired one-time code.
    #[error("invalid one-time code")]
    InvalidCode,
    #[error("operator account is disabled")]
    OperatorDisabled,
    #[error("operator account is locked after repeated failures")]
    OperatorLocked,
    #[error("company is inactive")]
    CompanyInactive,
    #[error("missing bearer token")]
    TokenMissing,
    #[error("invalid or expired session token")]
    TokenInvalid,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials
            | Self::InvalidCode
            | Self::TokenMissing
            | Self::TokenInvalid => StatusCode::UNAUTHORIZED,
            Self::OperatorDisabled | Self::OperatorLocked | Self::CompanyInactive => {
                StatusCode::FORBIDDEN
            }
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "Credenciales inválidas",
            Self::InvalidCode => "Usuario o código inválido",
            Self::OperatorDisabled => "El operador se encuentra inactivo.",
            Self::OperatorLocked => "Ha superado los intentos permitidos. Cuenta bloqueada.",
            Self::CompanyInactive => "La empresa asociada se encuentra inactiva.",
            Self::TokenMissing => "Token no proporcionado",
            Self::TokenInvalid => "Token inválido o sesión expirada",
            Self::Internal(_) => "Error interno",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let Self::Internal(err) = &self {
            error!("request failed: {err:#}");
        }
        (self.status(), Json(json!({ "detail": self.detail() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::AuthError;
    use anyhow::anyhow;
    use axum::{http::StatusCode, response::IntoResponse};

    #[test]
    fn authentication_errors_are_401() {
        assert_eq!(AuthError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::InvalidCode.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::TokenMissing.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::TokenInvalid.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn authorization_errors_are_403() {
        assert_eq!(AuthError::OperatorDisabled.status(), StatusCode::FORBIDDEN);
        assert_eq!(AuthError::OperatorLocked.status(), StatusCode::FORBIDDEN);
        assert_eq!(AuthError::CompanyInactive.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn credential_and_code_details_stay_generic() {
        // Account enumeration guard: neither message names the failing field.
        assert_eq!(AuthError::InvalidCredentials.detail(), "Credenciales inválidas");
        assert_eq!(AuthError::InvalidCode.detail(), "Usuario o código inválido");
    }

    #[test]
    fn internal_errors_map_to_500_with_opaque_detail() {
        let err = AuthError::Internal(anyhow!("connection refused"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.detail(), "Error interno");
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
