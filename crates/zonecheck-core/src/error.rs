//! Error types for the zonecheck suite
//!
//! Remote-service errors are classified (NotFound, Conflict, Forbidden, ...)
//! so scenarios can assert on the kind. Poller failures (`Timeout`,
//! `UnexpectedState`) carry enough context to diagnose a stuck zone.

use crate::zone::ZoneStatus;
use thiserror::Error;

/// Result type alias for zonecheck operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the zonecheck suite
#[derive(Error, Debug)]
pub enum Error {
    /// Poll budget exhausted before the zone reached the expected state
    #[error(
        "Timed out after {attempts} attempt(s) waiting for {resource_id} to become {expected} (last observed: {})",
        describe_status(.last_status)
    )]
    Timeout {
        /// Zone being watched
        resource_id: String,
        /// Human-readable target (a status, or "absent")
        expected: String,
        /// Last status observed before giving up
        last_status: Option<ZoneStatus>,
        /// Number of fetches performed
        attempts: u32,
    },

    /// Zone reached a terminal error state while being watched
    #[error("Zone {resource_id} reached unexpected state {status}")]
    UnexpectedState {
        /// Zone being watched
        resource_id: String,
        /// The error-class status that was observed
        status: ZoneStatus,
    },

    /// Resource not found (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Resource conflict (HTTP 409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Operation forbidden for this identity (HTTP 403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Authentication failed (HTTP 401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Remote service failure (HTTP 5xx)
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// Any other non-success response
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// Transport-level failures (connect, timeout, TLS)
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A scenario assertion did not hold
    #[error("Assertion failed: {0}")]
    Assertion(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

fn describe_status(status: &Option<ZoneStatus>) -> String {
    status.map_or_else(|| "nothing".to_string(), |s| s.to_string())
}

/// Coarse classification used by scenario assertions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Timeout,
    UnexpectedState,
    NotFound,
    Conflict,
    Forbidden,
    Unauthorized,
    Server,
    Api,
    Transport,
    Config,
    InvalidInput,
    Assertion,
    Other,
}

impl Error {
    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create a forbidden error
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    /// Create an authentication error
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// Create a server error
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    /// Create an error for an unclassified non-success response
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an HTTP transport error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an assertion failure
    pub fn assertion(msg: impl Into<String>) -> Self {
        Self::Assertion(msg.into())
    }

    /// Map an HTTP status code and body to a classified error
    ///
    /// Only meaningful for non-success codes.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 => Self::Unauthorized(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            409 => Self::Conflict(message),
            500..=599 => Self::Server { status, message },
            _ => Self::Api { status, message },
        }
    }

    /// Classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::UnexpectedState { .. } => ErrorKind::UnexpectedState,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::Server { .. } => ErrorKind::Server,
            Self::Api { .. } => ErrorKind::Api,
            Self::Http(_) => ErrorKind::Transport,
            Self::Json(_) => ErrorKind::Transport,
            Self::Config(_) => ErrorKind::Config,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Assertion(_) => ErrorKind::Assertion,
            Self::Other(_) => ErrorKind::Other,
        }
    }

    /// Whether this is a 404-style "not found"
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
