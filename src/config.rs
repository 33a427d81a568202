//! Application configuration module
//!
//! Handles loading and validating configuration from environment variables.

use crate::identity::Identity;
use std::net::Ipv4Addr;
use thiserror::Error;
use tracing::warn;

const DEV_JWT_SECRET: &str = "eip-governance-dev-secret-change-in-production";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: Ipv4Addr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Ipv4Addr::new(0, 0, 0, 0),
            port: 3000,
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:5173".to_string()],
        }
    }
}

/// Token configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Allow `POST /api/auth/token` to mint tokens for any address
    pub allow_dev_tokens: bool,
}

/// Complete application settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub auth: AuthConfig,
    /// Identity that deploys the registry and becomes its first Editor
    pub editor: Identity,
}

impl Settings {
    /// Load settings from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (ignore errors if file not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server = ServerConfig {
            host: lookup("HOST")
                .and_then(|h| h.parse().ok())
                .unwrap_or_else(|| ServerConfig::default().host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or_else(|| ServerConfig::default().port),
        };

        let cors = CorsConfig {
            allowed_origins: lookup("ALLOWED_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|| CorsConfig::default().allowed_origins),
        };

        let jwt_secret = lookup("JWT_SECRET").unwrap_or_else(|| {
            warn!("JWT_SECRET not set, using default (INSECURE - set in production!)");
            DEV_JWT_SECRET.to_string()
        });

        let allow_dev_tokens = match lookup("ALLOW_DEV_TOKENS") {
            Some(v) => parse_bool(&v)
                .ok_or_else(|| ConfigError::InvalidValue(format!("ALLOW_DEV_TOKENS={}", v)))?,
            None => false,
        };

        let editor_raw = lookup("EDITOR_ADDRESS")
            .ok_or_else(|| ConfigError::MissingVar("EDITOR_ADDRESS".to_string()))?;
        let editor = Identity::parse(&editor_raw)
            .map_err(|e| ConfigError::InvalidValue(e.to_string()))?;
        if editor.is_null() {
            return Err(ConfigError::InvalidValue(
                "EDITOR_ADDRESS cannot be the zero address".to_string(),
            ));
        }

        Ok(Self {
            server,
            cors,
            auth: AuthConfig {
                jwt_secret,
                allow_dev_tokens,
            },
            editor,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
