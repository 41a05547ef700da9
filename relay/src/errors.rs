use crate::config::ValidationError;
use http::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while relaying media
#[derive(Error, Debug)]
pub enum RelayError {
    /// The CDN answered with a non-2xx status after the optional range retry.
    #[error("upstream responded with {status} ({reason})")]
    UpstreamStatus { status: StatusCode, reason: String },

    #[error("upstream request failed: {0}")]
    UpstreamRequest(#[from] reqwest::Error),

    #[error("upstream did not respond within {0:?}")]
    UpstreamTimeout(Duration),

    #[error("upstream body stream failed: {0}")]
    BodyStream(reqwest::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] ValidationError),

    #[error("failed to build response: {0}")]
    Http(#[from] http::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RelayError {
    /// Short label used to tag error metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::UpstreamStatus { .. } => "upstream_status",
            RelayError::UpstreamRequest(_) => "upstream_request",
            RelayError::UpstreamTimeout(_) => "upstream_timeout",
            RelayError::BodyStream(_) => "body_stream",
            RelayError::Config(_) => "config",
            RelayError::Http(_) => "http",
            RelayError::Io(_) => "io",
        }
    }
}
