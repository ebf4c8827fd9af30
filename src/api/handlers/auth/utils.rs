//! Small helpers for one-time codes, token hashing, and request metadata.

use anyhow::{Context, Result};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

/// Generate a 6-hex-character one-time code (3 random bytes).
///
/// Treated as opaque by the rest of the flow; comparison is exact.
pub(super) fn generate_one_time_code() -> Result<String> {
    let mut bytes = [0u8; 3];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate one-time code")?;
    Ok(hex::encode(bytes))
}

/// Hash a bearer token so raw values never touch the database.
/// The hash is used for lookups when the cookie is presented.
pub(super) fn hash_bearer_token(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

/// Extract a client IP from common proxy headers.
pub(super) fn extract_client_ip(headers: &axum::http::HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if forwarded.is_some() {
        return forwarded.map(str::to_string);
    }
    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue};

    #[test]
    fn one_time_code_is_six_hex_chars() {
        let code = generate_one_time_code().unwrap();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn one_time_codes_vary() {
        // 3 random bytes; two consecutive draws colliding is ~1 in 16 million.
        let first = generate_one_time_code().unwrap();
        let second = generate_one_time_code().unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn hash_bearer_token_stable() {
        let first = hash_bearer_token("token");
        let second = hash_bearer_token("token");
        let different = hash_bearer_token("other");
        assert_eq!(first, second);
        assert_ne!(first, different);
        assert_eq!(first.len(), 32);
    }

    #[test]
    fn extract_client_ip_prefers_forwarded() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("1.2.3.4, 5.6.7.8"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("9.9.9.9"));
        assert_eq!(extract_client_ip(&headers), Some("1.2.3.4".to_string()));
    }

    #[test]
    fn extract_client_ip_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("9.9.9.9"));
        assert_eq!(extract_client_ip(&headers), Some("9.9.9.9".to_string()));
    }

    #[test]
    fn extract_client_ip_none_when_missing() {
        let headers = HeaderMap::new();
        assert_eq!(extract_client_ip(&headers), None);
    }
}
