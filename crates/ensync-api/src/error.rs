//! Error types for the request pipeline and the API operations built on it.

use std::time::Duration;

use thiserror::Error;

use crate::rate_limit::RateLimitError;
use crate::response::ErrorBody;

/// Result alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Failures raised while constructing a [`crate::Client`].
#[derive(Debug, Error)]
pub enum ClientBuildError {
    /// Base URL could not be parsed.
    #[error("invalid base url")]
    InvalidBaseUrl {
        /// Rejected input.
        url: String,
        /// Parser failure.
        #[source]
        source: url::ParseError,
    },
    /// Base URL parsed but cannot carry path segments.
    #[error("base url cannot be used as a base")]
    UnsupportedBaseUrl {
        /// Rejected input.
        url: String,
    },
    /// Rate limit settings are out of range.
    #[error("invalid rate limit")]
    RateLimit {
        /// Underlying validation failure.
        #[source]
        source: RateLimitError,
    },
    /// A default header name or value is invalid.
    #[error("invalid default header")]
    Header {
        /// Offending header name.
        name: String,
    },
    /// HTTP client could not be initialised.
    #[error("failed to build http client")]
    Http {
        /// reqwest failure.
        #[source]
        source: reqwest::Error,
    },
}

/// Failures raised by a single pass through the request pipeline.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The rate limiter wait ended before a token was available.
    #[error("rate limit exceeded")]
    RateLimitExceeded {
        /// Why the wait ended.
        #[source]
        source: RateLimitError,
    },
    /// Request body could not be serialised.
    #[error("failed to encode request body")]
    Encode {
        /// Serialisation failure.
        #[source]
        source: serde_json::Error,
    },
    /// Request URL could not be assembled.
    #[error("invalid request url")]
    InvalidUrl {
        /// Path that was being appended.
        path: String,
    },
    /// The outgoing request could not be built, usually an invalid header value.
    #[error("failed to build request")]
    Build {
        /// reqwest failure.
        #[source]
        source: reqwest::Error,
    },
    /// No response was obtained after all attempts.
    #[error("transport error after {attempts} attempt(s)")]
    Transport {
        /// Attempts made before giving up.
        attempts: u32,
        /// Last transport failure.
        #[source]
        source: reqwest::Error,
    },
    /// The overall request deadline elapsed.
    #[error("request timed out after {timeout:?}")]
    Timeout {
        /// Configured deadline.
        timeout: Duration,
    },
    /// The caller cancelled the request while it was in flight.
    #[error("request cancelled")]
    Cancelled,
    /// The response body could not be read.
    #[error("failed to read response body")]
    ReadBody {
        /// reqwest failure.
        #[source]
        source: reqwest::Error,
    },
    /// The server answered with a status of 400 or above.
    #[error(transparent)]
    Status(#[from] StatusError),
}

impl RequestError {
    /// Returns `true` when the failure happened before any response was received.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Timeout { .. })
    }
}

/// Error response returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", self.describe())]
pub struct StatusError {
    /// HTTP status code.
    pub status: u16,
    /// Structured body, when the server sent one.
    pub details: Option<ErrorBody>,
    /// Raw response body text.
    pub body: String,
}

impl StatusError {
    /// Human readable message: the structured message when present, the raw body otherwise.
    #[must_use]
    pub fn message(&self) -> &str {
        self.details
            .as_ref()
            .map_or_else(|| self.body.trim(), |details| details.message.as_str())
    }

    /// Application error code, when the body carried one.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.details.as_ref().and_then(|details| details.code.as_deref())
    }

    /// Returns `true` for 4xx responses.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.status >= 400 && self.status < 500
    }

    /// Returns `true` for 5xx responses.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status >= 500
    }

    fn describe(&self) -> String {
        match (&self.details, self.code()) {
            (Some(details), Some(code)) => format!(
                "api error (status {}, code {code}): {}",
                self.status, details.message
            ),
            (Some(details), None) => {
                format!("api error (status {}): {}", self.status, details.message)
            }
            (None, _) if self.body.trim().is_empty() => {
                format!("request failed with status {}", self.status)
            }
            (None, _) => format!(
                "request failed with status {}: {}",
                self.status,
                self.body.trim()
            ),
        }
    }
}

/// Failure of a named API operation.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request pipeline failed.
    #[error("{}", context(operation, target.as_deref()))]
    Request {
        /// Operation name, e.g. `list events`.
        operation: &'static str,
        /// Identifier the operation targeted.
        target: Option<String>,
        /// Pipeline failure.
        #[source]
        source: RequestError,
    },
    /// A successful response carried a body that did not decode.
    #[error("{}: failed to decode response", context(operation, target.as_deref()))]
    Decode {
        /// Operation name.
        operation: &'static str,
        /// Identifier the operation targeted.
        target: Option<String>,
        /// Decoder failure.
        #[source]
        source: serde_json::Error,
    },
}

fn context(operation: &str, target: Option<&str>) -> String {
    target.map_or_else(
        || operation.to_string(),
        |target| format!("{operation} '{target}'"),
    )
}

impl ApiError {
    /// Operation that failed.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Request { operation, .. } | Self::Decode { operation, .. } => *operation,
        }
    }

    /// Pipeline failure, when the error came from the request rather than decoding.
    #[must_use]
    pub const fn request_error(&self) -> Option<&RequestError> {
        match self {
            Self::Request { source, .. } => Some(source),
            Self::Decode { .. } => None,
        }
    }

    /// API error response, when the server answered with a failure status.
    #[must_use]
    pub const fn status_error(&self) -> Option<&StatusError> {
        match self.request_error() {
            Some(RequestError::Status(status)) => Some(status),
            _ => None,
        }
    }

    /// HTTP status of the failure response, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.status_error().map(|status| status.status)
    }

    /// Whether repeating the call later could succeed.
    ///
    /// Transport failures, timeouts, 5xx and 429 qualify. A local rate limiter
    /// failure does not: it means the caller cancelled or misconfigured the limiter.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self.request_error() {
            Some(RequestError::Status(status)) => status.is_server_error() || status.status == 429,
            Some(RequestError::Transport { .. } | RequestError::Timeout { .. }) => true,
            _ => false,
        }
    }
}
