//! Shared error types for the services crate.

use thiserror::Error;

/// Coarse failure classes of a dashboard request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network unreachable or a non-OK status.
    Transport,
    /// Well-formed response carrying `success: false` (or no `success` at all).
    Application,
    /// Body that is not JSON or lacks the expected shape.
    Malformed,
}

/// Errors emitted by `DashboardApi` implementations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("server reported failure: {}", .message.as_deref().unwrap_or("no message"))]
    Application { message: Option<String> },
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ApiError {
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            ApiError::Http(_) | ApiError::HttpStatus(_) => FailureKind::Transport,
            ApiError::Application { .. } => FailureKind::Application,
            ApiError::Malformed(_) => FailureKind::Malformed,
        }
    }

    /// Message supplied by the server, if this is an application failure that carried one.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Application { message } => message
                .as_deref()
                .map(str::trim)
                .filter(|message| !message.is_empty()),
            _ => None,
        }
    }
}

/// Errors emitted while reading `DashboardConfig`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid base url {raw:?}: {source}")]
    InvalidBaseUrl {
        raw: String,
        #[source]
        source: url::ParseError,
    },
    #[error("{name} must be a positive number of seconds, got {raw:?}")]
    InvalidSeconds { name: &'static str, raw: String },
}
