//! Auth configuration and shared state.

use std::sync::Arc;
use std::time::Duration;

use crate::api::notify::Notifier;

use super::token::TokenIssuer;

const DEFAULT_SESSION_TTL_SECONDS: i64 = 24 * 60 * 60;
const DEFAULT_CODE_TTL_SECONDS: i64 = 10 * 60;
const DEFAULT_CODE_MAX_ATTEMPTS: i32 = 5;
const DEFAULT_MAX_FAILED_LOGINS: i32 = 3;
const DEFAULT_NOTIFY_TIMEOUT_SECONDS: u64 = 8;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    session_ttl_seconds: i64,
    code_ttl_seconds: i64,
    code_max_attempts: i32,
    max_failed_logins: i32,
    notify_timeout: Duration,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String) -> Self {
        Self {
            frontend_base_url,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            code_ttl_seconds: DEFAULT_CODE_TTL_SECONDS,
            code_max_attempts: DEFAULT_CODE_MAX_ATTEMPTS,
            max_failed_logins: DEFAULT_MAX_FAILED_LOGINS,
            notify_timeout: Duration::from_secs(DEFAULT_NOTIFY_TIMEOUT_SECONDS),
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_code_ttl_seconds(mut self, seconds: i64) -> Self {
        self.code_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_code_max_attempts(mut self, attempts: i32) -> Self {
        self.code_max_attempts = attempts;
        self
    }

    #[must_use]
    pub fn with_max_failed_logins(mut self, attempts: i32) -> Self {
        self.max_failed_logins = attempts;
        self
    }

    #[must_use]
    pub fn with_notify_timeout_seconds(mut self, seconds: u64) -> Self {
        self.notify_timeout = Duration::from_secs(seconds);
        self
    }

    pub(crate) fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    pub(super) fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    pub(super) fn code_ttl_seconds(&self) -> i64 {
        self.code_ttl_seconds
    }

    pub(super) fn code_max_attempts(&self) -> i32 {
        self.code_max_attempts
    }

    pub(super) fn max_failed_logins(&self) -> i32 {
        self.max_failed_logins
    }

    pub(super) fn notify_timeout(&self) -> Duration {
        self.notify_timeout
    }
}

pub struct AuthState {
    config: AuthConfig,
    tokens: TokenIssuer,
    notifier: Arc<dyn Notifier>,
}

impl AuthState {
    pub fn new(config: AuthConfig, tokens: TokenIssuer, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            config,
            tokens,
            notifier,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub(super) fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    pub(super) fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::{AuthConfig, AuthState, TokenIssuer};
    use crate::api::notify::{LogMailer, Notifier};
    use secrecy::SecretString;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn auth_config_defaults_and_overrides() {
        let config = AuthConfig::new("https://erp.example.com".to_string());

        assert_eq!(config.frontend_base_url(), "https://erp.example.com");
        assert_eq!(config.session_ttl_seconds(), 86_400);
        assert_eq!(config.code_ttl_seconds(), 600);
        assert_eq!(config.code_max_attempts(), 5);
        assert_eq!(config.max_failed_logins(), 3);
        assert_eq!(config.notify_timeout(), Duration::from_secs(8));

        let config = config
            .with_session_ttl_seconds(3_600)
            .with_code_ttl_seconds(120)
            .with_code_max_attempts(2)
            .with_max_failed_logins(5)
            .with_notify_timeout_seconds(1);

        assert_eq!(config.session_ttl_seconds(), 3_600);
        assert_eq!(config.code_ttl_seconds(), 120);
        assert_eq!(config.code_max_attempts(), 2);
        assert_eq!(config.max_failed_logins(), 5);
        assert_eq!(config.notify_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn auth_state_exposes_parts() {
        let config = AuthConfig::new("https://erp.example.com".to_string());
        let tokens = TokenIssuer::new(SecretString::from("secret".to_string()));
        let notifier: Arc<dyn Notifier> = Arc::new(LogMailer);
        let state = AuthState::new(config, tokens, notifier);

        assert_eq!(state.config().frontend_base_url(), "https://erp.example.com");
        assert!(state.tokens().issue(7).is_ok());
    }
}
