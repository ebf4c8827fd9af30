pub mod server;

use secrecy::SecretString;

/// Action to be executed after argument parsing.
#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        dsn: String,
        signing_key: SecretString,
        mail_url: Option<String>,
        mail_from: String,
        frontend_url: String,
    },
}
