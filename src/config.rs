use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::infrastructure::storage::{FileCartStorage, DEFAULT_CART_KEY};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a valid number, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
        Err(_) => Ok(default),
    }
}

/// Settings for talking to the Order and Catalog services.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service base URL (e.g. "http://localhost:8080")
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    pub cart_dir: PathBuf,
    pub cart_key: String,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: 30,
            cart_dir: env::temp_dir(),
            cart_key: DEFAULT_CART_KEY.to_string(),
        }
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_secs = seconds;
        self
    }

    /// Reads `ORDER_API_URL`, `REQUEST_TIMEOUT_SECS`, `CART_STORAGE_DIR` and
    /// `CART_STORAGE_KEY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::new(var_or("ORDER_API_URL", "http://localhost:8080"));
        Ok(Self {
            timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", defaults.timeout_secs)?,
            cart_dir: env::var("CART_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cart_dir.clone()),
            cart_key: var_or("CART_STORAGE_KEY", &defaults.cart_key),
            ..defaults
        })
    }

    pub fn cart_storage(&self) -> FileCartStorage {
        FileCartStorage::new(&self.cart_dir, &self.cart_key)
    }
}

/// Bind address of the development Order Service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: var_or("HOST", "0.0.0.0"),
            port: parse_var("PORT", 8080)?,
        })
    }
}
