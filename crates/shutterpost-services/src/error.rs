//! Remote service errors
//!
//! Returned for transport, authentication and service failures only. A
//! search that finds nothing is `Ok(None)`, never an error.

use shutterpost_core::{ErrorMetadata, FileError, LogLevel};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Service error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    File(#[from] FileError),
}

/// Result type for remote operations
pub type RemoteResult<T> = Result<T, RemoteError>;

impl RemoteError {
    /// Network-level failure (connection, timeout, 5xx) rather than a refusal by the service.
    pub fn is_transport(&self) -> bool {
        match self {
            RemoteError::Transport(_) => true,
            RemoteError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, RemoteError::Status { status: 401 | 403, .. })
    }
}

impl ErrorMetadata for RemoteError {
    fn error_code(&self) -> &'static str {
        match self {
            RemoteError::Transport(_) => "REMOTE_TRANSPORT_ERROR",
            RemoteError::Status { .. } if self.is_auth() => "REMOTE_UNAUTHORIZED",
            RemoteError::Status { .. } => "REMOTE_STATUS_ERROR",
            RemoteError::Api { .. } => "REMOTE_API_ERROR",
            RemoteError::InvalidResponse(_) => "REMOTE_INVALID_RESPONSE",
            RemoteError::File(err) => err.error_code(),
        }
    }

    fn is_recoverable(&self) -> bool {
        self.is_transport()
    }

    fn log_level(&self) -> LogLevel {
        match self {
            RemoteError::File(err) => err.log_level(),
            _ if self.is_transport() => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}
