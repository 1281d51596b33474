//! Application configuration

use std::env;

use anyhow::{Context, Result};

use crate::infrastructure::cipher::SecretKey;

const DEFAULT_CALLBACK_PATH: &str = "/callback";
const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Application configuration loaded from environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Interface to bind
    pub server_host: String,
    /// HTTP server port
    pub server_port: u16,

    /// Token key; `None` means an ephemeral key is generated at startup
    pub secret_key: Option<SecretKey>,

    /// Path the dispatch endpoint is mounted on, also the base of offered URLs
    pub callback_path: String,

    /// Largest request body read for a callback
    pub max_body_bytes: usize,

    /// CORS allowed origins (comma-separated, or "*" for any); empty disables CORS
    pub cors_allowed_origins: Vec<String>,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let secret_key = match var("CALLGATE_SECRET_KEY").filter(|s| !s.trim().is_empty()) {
            Some(hex_key) => Some(
                SecretKey::from_hex(&hex_key)
                    .context("CALLGATE_SECRET_KEY must be 64 hex characters")?,
            ),
            None => None,
        };

        let callback_path = var("CALLGATE_CALLBACK_PATH")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_CALLBACK_PATH.to_string());
        if !callback_path.starts_with('/') {
            anyhow::bail!("CALLGATE_CALLBACK_PATH must start with '/': {callback_path}");
        }

        Ok(Self {
            server_host: var("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            server_port: var("SERVER_PORT")
                .or_else(|| var("PORT"))
                .unwrap_or_else(|| "3000".to_string())
                .parse()
                .context("SERVER_PORT must be a valid port number")?,

            secret_key,
            callback_path,

            max_body_bytes: match var("CALLGATE_MAX_BODY_BYTES") {
                Some(value) => value
                    .trim()
                    .parse()
                    .context("CALLGATE_MAX_BODY_BYTES must be a byte count")?,
                None => DEFAULT_MAX_BODY_BYTES,
            },

            cors_allowed_origins: var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_default()
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 3000,
            secret_key: None,
            callback_path: DEFAULT_CALLBACK_PATH.to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            cors_allowed_origins: Vec::new(),
        }
    }
}
