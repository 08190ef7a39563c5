//! Env-driven server configuration.

use secrecy::SecretString;
use std::net::SocketAddr;

/// Configuration loading failure.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is missing or empty.
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    /// A variable is present but unparseable.
    #[error("invalid value for {name}: {message}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// What was wrong with it.
        message: String,
    },
}

/// Complete server configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Socket the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// Postgres connection string.
    pub database_url: String,
    /// Maximum database pool connections.
    pub db_max_connections: u32,
    /// HS256 secret for bearer token verification.
    pub jwt_secret: SecretString,
    /// Key material for credential encryption at rest. Interpreted as a
    /// 64-char hex key when it parses as one, otherwise as a passphrase.
    pub encryption_key: SecretString,
    /// Comma-separated allowed CORS origins.
    pub cors_origins: Vec<String>,
}

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173";

impl Config {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| -> Result<String, ConfigError> {
            match lookup(name) {
                Some(value) if !value.trim().is_empty() => Ok(value),
                _ => Err(ConfigError::Missing(name)),
            }
        };

        let bind_addr = lookup("PROMPTMUX_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                name: "PROMPTMUX_BIND_ADDR",
                message: e.to_string(),
            })?;

        let db_max_connections = match lookup("PROMPTMUX_DB_MAX_CONNECTIONS") {
            Some(raw) => raw.parse::<u32>().map_err(|e| ConfigError::Invalid {
                name: "PROMPTMUX_DB_MAX_CONNECTIONS",
                message: e.to_string(),
            })?,
            None => DEFAULT_DB_MAX_CONNECTIONS,
        };

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            bind_addr,
            database_url: required("DATABASE_URL")?,
            db_max_connections,
            jwt_secret: SecretString::new(required("JWT_SECRET_KEY")?),
            encryption_key: SecretString::new(required("ENCRYPTION_KEY")?),
            cors_origins,
        })
    }
}
