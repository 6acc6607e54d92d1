//! Configuration loaded from environment variables with development
//! defaults. A `.env` file is honored in debug builds.

use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
}

/// Shared signing secret and session lifetime. Owned by the composition
/// root and injected into the token codec and the account service; the
/// secret is never read from a global.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub session_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            redis: RedisConfig::from_env()?,
            auth: AuthConfig::from_env()?,
        })
    }

    pub fn is_production(&self) -> bool {
        self.app.env == "production"
    }
}

impl AppConfig {
    fn from_env() -> Result<Self> {
        Ok(Self {
            env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            host: env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("APP_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid APP_PORT")?,
        })
    }
}

impl DatabaseConfig {
    fn from_env() -> Result<Self> {
        Ok(Self {
            url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .context("Invalid DATABASE_MAX_CONNECTIONS")?,
        })
    }
}

impl RedisConfig {
    fn from_env() -> Result<Self> {
        Ok(Self {
            url: env::var("REDIS_URL").context("REDIS_URL must be set")?,
        })
    }
}

impl AuthConfig {
    fn from_env() -> Result<Self> {
        Ok(Self {
            secret: env::var("AUTH_SECRET").context("AUTH_SECRET must be set")?,
            session_ttl_secs: env::var("SESSION_TTL_SECS")
                .unwrap_or_else(|_| "7200".to_string())
                .parse()
                .context("Invalid SESSION_TTL_SECS")?,
        })
    }
}
