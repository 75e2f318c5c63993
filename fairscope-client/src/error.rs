//! Error types for the fairscope client

use fairscope_core::domain::result::ResultParseError;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when submitting a fairness task
///
/// Any of these means no task handle exists and polling must not start.
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// The request never got an HTTP answer
    #[error("submission request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The backend answered with a non-2xx status
    #[error("submission rejected (status {status}): {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// None of the configured status headers was present
    #[error("submission response carries no status URL (looked for: {0})")]
    MissingStatusHeader(String),

    /// The status header could not be turned into a URL
    #[error("invalid status URL `{url}`: {reason}")]
    InvalidStatusUrl {
        /// Raw header value
        url: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Errors that can occur during a single status poll
#[derive(Debug, Error)]
pub enum PollError {
    /// The request never got an HTTP answer
    #[error("status request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The status endpoint answered with a non-2xx status
    #[error("status request rejected (status {status}): {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// The body is not a status document
    #[error("malformed status response: {0}")]
    MalformedBody(String),
}

/// Reason a polling loop stopped without reaching a terminal state
#[derive(Debug, Error)]
pub enum LoopError {
    #[error(transparent)]
    Poll(#[from] PollError),

    #[error("task succeeded but its result is unusable: {0}")]
    Result(#[from] ResultParseError),
}

/// Errors that can occur when using the fairscope client
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// A status poll failed
    #[error(transparent)]
    Poll(#[from] PollError),
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ApiError { status: 404, .. } | Self::Poll(PollError::Rejected { status: 404, .. })
        )
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self.status(), Some(status) if status >= 500)
    }

    fn status(&self) -> Option<u16> {
        match self {
            Self::ApiError { status, .. } | Self::Poll(PollError::Rejected { status, .. }) => {
                Some(*status)
            }
            _ => None,
        }
    }
}
