use std::env;
use std::fmt;

use crate::auth::password::COST_RANGE;
use crate::auth::token::SESSION_TTL_RANGE;
use crate::i18n::Locale;

/// Runtime settings, read from the process environment (and `.env` via `dotenv`).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    /// HMAC secret used to sign session tokens.
    pub secret_key: String,
    pub session_ttl_hours: i64,
    pub bcrypt_cost: u32,
    /// Locale used when the request does not ask for a supported one.
    pub default_locale: Locale,
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str, String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(name) => write!(f, "{} must be set", name),
            ConfigError::Invalid(name, value) => write!(f, "{} has an invalid value: {}", name, value),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret_key = lookup("SECRET_KEY")
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::Missing("SECRET_KEY"))?;

        let bcrypt_cost = parse_or(&lookup, "BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !COST_RANGE.contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid("BCRYPT_COST", bcrypt_cost.to_string()));
        }

        let session_ttl_hours = parse_or(&lookup, "SESSION_TTL_HOURS", 24)?;
        if !SESSION_TTL_RANGE.contains(&session_ttl_hours) {
            return Err(ConfigError::Invalid(
                "SESSION_TTL_HOURS",
                session_ttl_hours.to_string(),
            ));
        }

        Ok(Self {
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://task_manager.db".to_string()),
            server_port: parse_or(&lookup, "SERVER_PORT", 8080)?,
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            secret_key,
            session_ttl_hours,
            bcrypt_cost,
            default_locale: match lookup("LANGUAGE_CODE") {
                Some(code) => Locale::from_tag(&code)
                    .ok_or(ConfigError::Invalid("LANGUAGE_CODE", code))?,
                None => Locale::En,
            },
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid(name, raw)),
        None => Ok(default),
    }
}
