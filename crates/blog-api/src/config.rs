//! Service configuration loaded from YAML

use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use blog_auth::TokenConfig;
use chrono::Duration;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("jwt.key must be set to a non-empty signing secret")]
    MissingSecret,

    #[error("jwt.accessTokenExpiryHours must be between 1 and 876000, got {0}")]
    InvalidExpiry(i64),
}

/// Upper bound on `jwt.accessTokenExpiryHours` (100 years)
pub const MAX_ACCESS_TOKEN_EXPIRY_HOURS: i64 = 24 * 365 * 100;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BlogConfig {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_addr: SocketAddr,
    pub enable_cors: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 9090)),
            enable_cors: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "sqlite://./blog.db?mode=rwc".to_string(),
        }
    }
}

/// Token signing settings
#[derive(Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JwtSettings {
    /// HMAC signing secret
    pub key: String,
    pub issuer: String,
    pub audience: String,
    pub access_token_expiry_hours: i64,
    /// Accepted for compatibility; refresh tokens are not issued
    pub refresh_token_expiry_days: i64,
}

impl Default for JwtSettings {
    fn default() -> Self {
        Self {
            key: String::new(),
            issuer: "blog-api".to_string(),
            audience: "blog-clients".to_string(),
            access_token_expiry_hours: 24,
            refresh_token_expiry_days: 7,
        }
    }
}

impl fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSettings")
            .field("key", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("access_token_expiry_hours", &self.access_token_expiry_hours)
            .field("refresh_token_expiry_days", &self.refresh_token_expiry_days)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// EnvFilter directive, e.g. "info" or "blog_api=debug,info"
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl BlogConfig {
    /// Read and validate a YAML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_yaml_str(&contents)
    }

    /// Parse without validating; callers apply overrides then [`validate`](Self::validate)
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(contents)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.key.trim().is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        self.access_token_ttl()?;
        Ok(())
    }

    /// Access token lifetime, rejecting values outside `1..=MAX_ACCESS_TOKEN_EXPIRY_HOURS`
    pub fn access_token_ttl(&self) -> Result<Duration, ConfigError> {
        let hours = self.jwt.access_token_expiry_hours;
        if !(1..=MAX_ACCESS_TOKEN_EXPIRY_HOURS).contains(&hours) {
            return Err(ConfigError::InvalidExpiry(hours));
        }
        Duration::try_hours(hours).ok_or(ConfigError::InvalidExpiry(hours))
    }

    pub fn token_config(&self) -> Result<TokenConfig, ConfigError> {
        Ok(TokenConfig {
            secret: self.jwt.key.clone(),
            issuer: self.jwt.issuer.clone(),
            audience: self.jwt.audience.clone(),
            access_token_ttl: self.access_token_ttl()?,
        })
    }
}
