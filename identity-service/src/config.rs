//! Configuration management for the identity service
//!
//! Loads settings from:
//! 1. Environment variables
//! 2. .env file (local development)
//!
//! Settings are constructed once at startup and passed into each component
//! so tests can substitute fixtures; no global configuration state exists.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use tracing::info;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub server: ServerSettings,
}

impl Settings {
    /// Load settings from environment variables
    pub fn load() -> Result<Self> {
        // Load .env file in development
        if cfg!(debug_assertions) {
            dotenvy::dotenv().ok();
            info!("Loaded .env file for development");
        }

        Ok(Settings {
            database: DatabaseSettings::from_env()?,
            auth: AuthSettings::from_env()?,
            server: ServerSettings::from_env()?,
        })
    }
}

/// Database connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: u64,
}

impl DatabaseSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .context("Invalid DATABASE_MAX_CONNECTIONS")?,
            acquire_timeout: env::var("DATABASE_ACQUIRE_TIMEOUT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid DATABASE_ACQUIRE_TIMEOUT")?,
        })
    }
}

/// Bearer token settings
///
/// `secret_key` is the process-wide HS256 signing key; it is read-only
/// after startup and never derived from request data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    pub secret_key: String,
    pub token_ttl_minutes: i64,
}

impl AuthSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            secret_key: env::var("SECRET_KEY").context("SECRET_KEY must be set")?,
            token_ttl_minutes: env::var("ACCESS_TOKEN_EXPIRE_MINUTES")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("Invalid ACCESS_TOKEN_EXPIRE_MINUTES")?,
        })
    }
}

/// Server bind configuration for both transports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub http_port: u16,
    pub grpc_port: u16,
}

impl ServerSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: env::var("SERVER_HTTP_PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .context("Invalid SERVER_HTTP_PORT")?,
            grpc_port: env::var("SERVER_GRPC_PORT")
                .unwrap_or_else(|_| "50051".to_string())
                .parse()
                .context("Invalid SERVER_GRPC_PORT")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_auth_settings_from_env() {
        env::set_var("SECRET_KEY", "test-secret-key");
        env::set_var("ACCESS_TOKEN_EXPIRE_MINUTES", "45");

        let settings = AuthSettings::from_env().unwrap();

        assert_eq!(settings.secret_key, "test-secret-key");
        assert_eq!(settings.token_ttl_minutes, 45);

        env::remove_var("SECRET_KEY");
        env::remove_var("ACCESS_TOKEN_EXPIRE_MINUTES");
    }

    #[test]
    #[serial]
    fn test_auth_settings_default_ttl() {
        env::set_var("SECRET_KEY", "test-secret-key");
        env::remove_var("ACCESS_TOKEN_EXPIRE_MINUTES");

        let settings = AuthSettings::from_env().unwrap();

        assert_eq!(settings.token_ttl_minutes, 30); // Default

        env::remove_var("SECRET_KEY");
    }

    #[test]
    #[serial]
    fn test_database_settings_from_env() {
        env::set_var("DATABASE_URL", "postgres://localhost/identity_test");
        env::set_var("DATABASE_MAX_CONNECTIONS", "50");

        let settings = DatabaseSettings::from_env().unwrap();

        assert_eq!(settings.url, "postgres://localhost/identity_test");
        assert_eq!(settings.max_connections, 50);
        assert_eq!(settings.acquire_timeout, 10); // Default

        env::remove_var("DATABASE_URL");
        env::remove_var("DATABASE_MAX_CONNECTIONS");
    }

    #[test]
    #[serial]
    fn test_server_settings_defaults() {
        env::remove_var("SERVER_HOST");
        env::remove_var("SERVER_HTTP_PORT");
        env::remove_var("SERVER_GRPC_PORT");

        let settings = ServerSettings::from_env().unwrap();

        assert_eq!(settings.host, "0.0.0.0");
        assert_eq!(settings.http_port, 8000);
        assert_eq!(settings.grpc_port, 50051);
    }
}
