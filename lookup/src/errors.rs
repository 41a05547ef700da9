use crate::config::ValidationError;
use http::StatusCode;
use thiserror::Error;

/// Errors that can occur while serving lookups
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Lookup API returned {status}: {body}")]
    UpstreamStatus { status: StatusCode, body: String },

    #[error("Lookup API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid or missing secUid in user response")]
    MissingSecUid,

    #[error("Invalid lookup API path: {0}")]
    InvalidPath(#[from] url::ParseError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ValidationError),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] http::header::InvalidHeaderValue),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
