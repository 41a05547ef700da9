use serde::Deserialize;
use shared::config::{Listener, ListenerError};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const DEFAULT_MEDIA_URL: &str = "https://www.tiktok.com/aweme/v1/play/";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Invalid listener: {0}")]
    Listener(#[from] ListenerError),

    #[error("Timeout cannot be 0: {0}")]
    ZeroTimeout(&'static str),

    #[error("Unsupported forward proxy scheme: {0}")]
    UnsupportedProxyScheme(String),

    #[error("Forward proxy password given without a username")]
    PasswordWithoutUsername,

    #[error("User agent is not a valid header value")]
    InvalidUserAgent,
}

/// Relay configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Listener serving relayed media
    pub listener: Listener,
    /// Admin listener for health and readiness checks
    pub admin_listener: Listener,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Every upstream request is routed through this proxy
    pub forward_proxy: ForwardProxyConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;
        self.upstream.validate()?;
        self.forward_proxy.validate()?;
        Ok(())
    }
}

/// The CDN endpoint and how to talk to it
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Media-play endpoint; the signed query is appended to it
    pub media_url: Url,
    /// Browser identity sent upstream. The CDN refuses clients that don't look like one.
    pub user_agent: String,
    pub connect_timeout_secs: u64,
    /// Upper bound for each attempt to receive response headers
    pub response_timeout_secs: u64,
    /// Idle limit between two reads of the response body
    pub read_timeout_secs: u64,
}

impl UpstreamConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_secs(self.response_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.connect_timeout_secs == 0 {
            return Err(ValidationError::ZeroTimeout("connect_timeout_secs"));
        }
        if self.response_timeout_secs == 0 {
            return Err(ValidationError::ZeroTimeout("response_timeout_secs"));
        }
        if self.read_timeout_secs == 0 {
            return Err(ValidationError::ZeroTimeout("read_timeout_secs"));
        }
        if http::HeaderValue::from_str(&self.user_agent).is_err() {
            return Err(ValidationError::InvalidUserAgent);
        }
        Ok(())
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        UpstreamConfig {
            media_url: Url::parse(DEFAULT_MEDIA_URL).expect("default media url is valid"),
            user_agent: DEFAULT_USER_AGENT.into(),
            connect_timeout_secs: 5,
            response_timeout_secs: 30,
            read_timeout_secs: 30,
        }
    }
}

/// Forward proxy address and optional basic-auth credentials.
#[derive(Clone, Deserialize, PartialEq)]
pub struct ForwardProxyConfig {
    pub url: Url,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ForwardProxyConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        match self.url.scheme() {
            "http" | "https" => {}
            other => return Err(ValidationError::UnsupportedProxyScheme(other.into())),
        }
        if self.password.is_some() && self.username.is_none() {
            return Err(ValidationError::PasswordWithoutUsername);
        }
        Ok(())
    }
}

// Keeps the password out of logs.
impl fmt::Debug for ForwardProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForwardProxyConfig")
            .field("url", &self.url.as_str())
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
