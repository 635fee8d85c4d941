use std::net::SocketAddr;

use thiserror::Error;
use tracing::Level;
use url::Url;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://quiz_bot.db";
pub const DEFAULT_MAX_QUESTIONS_PER_USER: i64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} should be set.")]
    Missing(&'static str),
    #[error("{name} can't be parsed: '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Public address and local bind address for the webhook listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Webhook {
    pub url: Url,
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub token: String,
    pub database_url: String,
    /// Parsed for completeness; no handler treats admins differently.
    pub admin_ids: Vec<i64>,
    pub max_questions_per_user: i64,
    pub log_level: Level,
    pub webhook: Option<Webhook>,
}

fn parse<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_owned(),
    })
}

impl Settings {
    /// Reads settings from the process environment (after `.env` is loaded).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let token = lookup("TELOXIDE_TOKEN").ok_or(ConfigError::Missing("TELOXIDE_TOKEN"))?;

        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned());

        let admin_ids: Vec<i64> = match lookup("ADMIN_IDS") {
            Some(raw) => raw
                .split(',')
                .filter(|id| !id.trim().is_empty())
                .map(|id| parse("ADMIN_IDS", id))
                .collect::<Result<_, _>>()?,
            None => Vec::new(),
        };

        let max_questions_per_user: i64 = match lookup("MAX_QUESTIONS_PER_USER") {
            Some(raw) => parse("MAX_QUESTIONS_PER_USER", &raw)?,
            None => DEFAULT_MAX_QUESTIONS_PER_USER,
        };

        let log_level: Level = match lookup("LOG_LEVEL") {
            Some(raw) => parse("LOG_LEVEL", &raw)?,
            None => Level::INFO,
        };

        let webhook = match (lookup("NGROK_URL"), lookup("NGROK_ADDR")) {
            (Some(url), Some(addr)) => Some(Webhook {
                url: parse("NGROK_URL", &url)?,
                addr: parse("NGROK_ADDR", &addr)?,
            }),
            _ => None,
        };

        Ok(Self {
            token,
            database_url,
            admin_ids,
            max_questions_per_user,
            log_level,
            webhook,
        })
    }

    pub fn has_quota_left(&self, questions_added: i64) -> bool {
        questions_added < self.max_questions_per_user
    }
}
