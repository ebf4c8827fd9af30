//! Bearer token issuance.
//!
//! Tokens are signed HS256 JWTs binding the operator id and a random nonce.
//! The signature only guards against forging syntactically plausible tokens;
//! authorization truth is "does a row with this token's hash exist in
//! `active_sessions`"; claims are never re-validated per request.

use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Operator id.
    pub sub: i64,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Random nonce; makes every issued token unique.
    pub jti: String,
}

/// Signs bearer tokens with the injected process-wide key.
pub struct TokenIssuer {
    signing_key: SecretString,
}

impl TokenIssuer {
    #[must_use]
    pub fn new(signing_key: SecretString) -> Self {
        Self { signing_key }
    }

    /// Mint a fresh token for the operator.
    ///
    /// # Errors
    /// Returns an error if JWT encoding fails.
    pub fn issue(&self, operator_id: i64) -> Result<String> {
        let claims = TokenClaims {
            sub: operator_id,
            iat: Utc::now().timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.signing_key.expose_secret().as_bytes()),
        )
        .context("failed to sign bearer token")
    }
}
