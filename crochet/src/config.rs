//! Backend configuration
//!
//! The mobile shell passes this in (usually deserialized from the same JSON
//! blob it uses to initialize the backend SDK). Nothing is read from the
//! environment.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid database URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Unsupported URL scheme: {0}")]
    Scheme(String),
    #[error("Invalid products path: {0:?}")]
    ProductsPath(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

pub const DEFAULT_PRODUCTS_PATH: &str = "products";
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;

/// Where the product catalog lives
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, uniffi::Record)]
pub struct BackendConfig {
    /// Realtime Database root, e.g. `https://my-app-default-rtdb.firebaseio.com`
    #[serde(alias = "databaseURL")]
    pub database_url: String,
    /// Collection holding the products, relative to the root
    #[serde(default = "default_products_path")]
    pub products_path: String,
    /// Sent as the `auth` query parameter when present
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_products_path() -> String {
    DEFAULT_PRODUCTS_PATH.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl BackendConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            products_path: default_products_path(),
            auth_token: None,
            timeout_ms: default_timeout_ms(),
        }
    }

    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.base_url()?;
        let path = self.products_path.trim_matches('/');
        if path.is_empty() || path.contains(['?', '#', '.']) {
            return Err(ConfigError::ProductsPath(self.products_path.clone()));
        }
        Ok(())
    }

    /// Database root with a trailing slash so relative joins append
    pub fn base_url(&self) -> ConfigResult<Url> {
        let mut url = Url::parse(self.database_url.trim())?;
        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(ConfigError::Scheme(url.scheme().to_string()));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
