//! One-time code delivery.
//!
//! The login flow hands verification codes to a [`Notifier`]; delivery is
//! best-effort and time-bounded by the caller. A relay failure is logged and
//! never turns a successful authentication into a user-visible error.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

const RELAY_TIMEOUT: Duration = Duration::from_secs(8);

/// Outbound notification abstraction used by the login flow.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a message or return an error for the caller to log.
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

/// Posts messages as form data to the internal mail relay.
pub struct HttpMailer {
    client: reqwest::Client,
    relay_url: String,
    from: String,
}

impl HttpMailer {
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(relay_url: String, from: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(RELAY_TIMEOUT)
            .build()
            .context("failed to build mail relay client")?;
        Ok(Self {
            client,
            relay_url,
            from,
        })
    }
}

#[async_trait]
impl Notifier for HttpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        self.client
            .post(&self.relay_url)
            .form(&[
                ("destino", to),
                ("asunto", subject),
                ("detalle", body),
                ("from", self.from.as_str()),
            ])
            .send()
            .await
            .context("mail relay request failed")?
            .error_for_status()
            .context("mail relay rejected the message")?;
        Ok(())
    }
}

/// Local dev sender that logs the message instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogMailer;

#[async_trait]
impl Notifier for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        info!(
            to_email = %to,
            subject = %subject,
            body = %body,
            "mail send stub"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{HttpMailer, LogMailer, Notifier};

    #[tokio::test]
    async fn log_mailer_always_succeeds() {
        let mailer = LogMailer;
        let result = mailer
            .send("ana@example.com", "Código de Verificación", "Hola")
            .await;
        assert!(result.is_ok());
    }

    #[test]
    fn http_mailer_builds() {
        let mailer = HttpMailer::new(
            "http://mail.internal/send".to_string(),
            "garita".to_string(),
        );
        assert!(mailer.is_ok());
    }
}
