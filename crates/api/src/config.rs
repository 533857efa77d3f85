use std::path::PathBuf;

use thiserror::Error;

use crate::auth::JwtConfig;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DATABASE_URL: &str = "sqlite://pathway.sqlite3";
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_TOKEN_TTL_MINS: i64 = 24 * 60;

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{var} has an invalid value: {value}")]
    Invalid { var: &'static str, value: String },
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// `sqlx` URL of the progress database.
    pub database_url: String,
    /// Allowed CORS origins, from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    pub jwt: JwtConfig,
    /// Replacement catalog file; the built-in catalog is used when unset.
    pub catalog_path: Option<PathBuf>,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `DATABASE_URL`         | `sqlite://pathway.sqlite3` |
    /// | `CORS_ORIGINS`         | `http://localhost:3000`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `AUTH_JWT_SECRET`      | required                   |
    /// | `AUTH_TOKEN_TTL_MINS`  | `1440`                     |
    /// | `CATALOG_PATH`         | unset                      |
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the secret is missing or a number does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ServerConfig::from_env`] with an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the secret is missing or a number does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = var("HOST").unwrap_or_else(|| DEFAULT_HOST.into());
        let port = parse_or(var("PORT"), "PORT", DEFAULT_PORT)?;
        let database_url = var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into());
        let cors_origins = var("CORS_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let request_timeout_secs = parse_or(
            var("REQUEST_TIMEOUT_SECS"),
            "REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;

        let secret = var("AUTH_JWT_SECRET").ok_or(ConfigError::Missing("AUTH_JWT_SECRET"))?;
        let token_ttl_mins = parse_or(
            var("AUTH_TOKEN_TTL_MINS"),
            "AUTH_TOKEN_TTL_MINS",
            DEFAULT_TOKEN_TTL_MINS,
        )?;

        Ok(Self {
            host,
            port,
            database_url,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig {
                secret,
                token_ttl_mins,
            },
            catalog_path: var("CATALOG_PATH").map(PathBuf::from),
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    raw: Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}
