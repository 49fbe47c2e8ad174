use std::env;
use std::fmt;

const DEFAULT_JWT_EXPIRATION_SECS: i64 = 60 * 60 * 24 * 7; // 7 days
const DEFAULT_JSON_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Runtime configuration, read from the environment (and `.env` in development).
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL URL. `None` runs the service on the in-memory stores.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub server_port: u16,
    pub server_host: String,
    pub jwt_secret: String,
    /// Lifetime written into every issued bearer token.
    pub jwt_expiration_secs: i64,
    pub bcrypt_cost: u32,
    /// Upper bound for JSON bodies; todo images travel inline as base64.
    pub json_body_limit: usize,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { var: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(var) => write!(f, "{} must be set", var),
            ConfigError::Invalid { var, value } => {
                write!(f, "{} has an invalid value: {:?}", var, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, so callers other than the
    /// process environment (tests, embedding) can supply values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|secret| !secret.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let bcrypt_cost = parse_or(&lookup, "BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                var: "BCRYPT_COST",
                value: bcrypt_cost.to_string(),
            });
        }

        let jwt_expiration_secs =
            parse_or(&lookup, "JWT_EXPIRATION_SECS", DEFAULT_JWT_EXPIRATION_SECS)?;
        if jwt_expiration_secs <= 0 {
            return Err(ConfigError::Invalid {
                var: "JWT_EXPIRATION_SECS",
                value: jwt_expiration_secs.to_string(),
            });
        }

        Ok(Self {
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?,
            server_port: parse_or(&lookup, "SERVER_PORT", 8000)?,
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            jwt_secret,
            jwt_expiration_secs,
            bcrypt_cost,
            json_body_limit: parse_or(&lookup, "JSON_BODY_LIMIT", DEFAULT_JSON_BODY_LIMIT)?,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(default),
    }
}
