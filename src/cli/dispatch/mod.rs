use crate::cli::actions::Action;
use anyhow::{Context, Result};
use secrecy::SecretString;

pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    Ok(Action::Server {
        port: matches.get_one::<u16>("port").copied().unwrap_or(8080),
        dsn: matches
            .get_one::<String>("dsn")
            .map(String::to_string)
            .context("missing required argument: --dsn")?,
        signing_key: matches
            .get_one::<String>("signing-key")
            .map(|key| SecretString::from(key.to_string()))
            .context("missing required argument: --signing-key")?,
        mail_url: matches.get_one::<String>("mail-url").map(String::to_string),
        mail_from: matches
            .get_one::<String>("mail-from")
            .map_or_else(|| "garita".to_string(), String::to_string),
        frontend_url: matches
            .get_one::<String>("frontend-url")
            .map_or_else(|| "http://localhost:3000".to_string(), String::to_string),
    })
}
