use crate::api;
use crate::api::handlers::auth::{AuthConfig, AuthState, TokenIssuer};
use crate::api::notify::{HttpMailer, LogMailer, Notifier};
use crate::cli::actions::Action;
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            dsn,
            signing_key,
            mail_url,
            mail_from,
            frontend_url,
        } => {
            let config = AuthConfig::new(frontend_url);
            let tokens = TokenIssuer::new(signing_key);

            // Without a relay the codes are logged; useful for local dev.
            let notifier: Arc<dyn Notifier> = match mail_url {
                Some(url) => Arc::new(HttpMailer::new(url, mail_from)?),
                None => {
                    info!("no mail relay configured, one-time codes will be logged");
                    Arc::new(LogMailer)
                }
            };

            let auth_state = Arc::new(AuthState::new(config, tokens, notifier));

            api::new(port, dsn, auth_state).await?;
        }
    }

    Ok(())
}
