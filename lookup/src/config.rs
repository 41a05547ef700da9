use serde::Deserialize;
use shared::config::{Listener, ListenerError};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Environment variable consulted when the config carries no API key.
pub const API_KEY_ENV: &str = "TIKAPI_KEY";

const DEFAULT_BASE_URL: &str = "https://api.tikapi.io/public/";

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Invalid listener: {0}")]
    Listener(#[from] ListenerError),

    #[error("API base URL must end with '/': {0}")]
    BaseUrlWithoutTrailingSlash(String),

    #[error("Value cannot be 0: {0}")]
    Zero(&'static str),

    #[error("Relay path must start with '/': {0}")]
    InvalidRelayPath(String),

    #[error("No API key configured and TIKAPI_KEY is not set")]
    MissingApiKey,
}

/// Lookup service configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    pub listener: Listener,
    pub admin_listener: Listener,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    /// Path of the relay endpoint, used to build playable links for posts
    #[serde(default = "default_relay_path")]
    pub relay_path: String,
}

fn default_relay_path() -> String {
    relay::RELAY_PATH.to_string()
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;
        self.api.validate()?;
        self.cache.validate()?;

        if !self.relay_path.starts_with('/') {
            return Err(ValidationError::InvalidRelayPath(self.relay_path.clone()));
        }

        Ok(())
    }
}

/// Third-party lookup API settings
#[derive(Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    /// Endpoint paths are joined onto this URL
    pub base_url: Url,
    pub api_key: Option<String>,
    pub country: String,
    /// Posts per page for profile lookups
    pub page_size: u32,
    /// Posts fetched for the trending feed
    pub trending_count: u32,
    pub timeout_secs: u64,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The configured key, or the one from the environment.
    pub fn resolve_api_key(&self) -> Result<String, ValidationError> {
        self.api_key_or(std::env::var(API_KEY_ENV).ok())
    }

    fn api_key_or(&self, from_env: Option<String>) -> Result<String, ValidationError> {
        self.api_key
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| from_env.filter(|key| !key.is_empty()))
            .ok_or(ValidationError::MissingApiKey)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if !self.base_url.path().ends_with('/') {
            return Err(ValidationError::BaseUrlWithoutTrailingSlash(
                self.base_url.to_string(),
            ));
        }
        if self.page_size == 0 {
            return Err(ValidationError::Zero("page_size"));
        }
        if self.trending_count == 0 {
            return Err(ValidationError::Zero("trending_count"));
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::Zero("timeout_secs"));
        }
        Ok(())
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
            api_key: None,
            country: "us".into(),
            page_size: 9,
            trending_count: 10,
            timeout_secs: 30,
        }
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("country", &self.country)
            .field("page_size", &self.page_size)
            .field("trending_count", &self.trending_count)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// First-page profile cache
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_capacity: u64,
    pub ttl_secs: u64,
}

impl CacheConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if !self.enabled {
            return Ok(());
        }
        if self.max_capacity == 0 {
            return Err(ValidationError::Zero("max_capacity"));
        }
        if self.ttl_secs == 0 {
            return Err(ValidationError::Zero("ttl_secs"));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            enabled: true,
            max_capacity: 10_000,
            ttl_secs: 300,
        }
    }
}
